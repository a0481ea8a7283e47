use config::{builder::DefaultState, ConfigBuilder};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub roster_path: String,
    pub top_k: usize,
    pub metrics_addr: SocketAddr,
}

impl Config {
    /// Defaults, then `config/engine.toml` if present, then `STUDYMATCH_*` env vars.
    pub fn load() -> Result<Self, AppError> {
        let builder = Self::defaults()?
            .add_source(config::File::with_name("config/engine").required(false))
            .add_source(config::Environment::with_prefix("STUDYMATCH").try_parsing(true));
        Self::from_builder(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, AppError> {
        Ok(config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:5000")?
            .set_default("roster_path", "data/students.csv")?
            .set_default("top_k", 3_i64)?
            .set_default("metrics_addr", "0.0.0.0:9000")?)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let config = builder.build()?.try_deserialize::<Config>()?;

        if config.top_k == 0 {
            return Err(AppError::InvalidConfig("top_k must be at least 1".to_string()));
        }

        Ok(config)
    }
}
