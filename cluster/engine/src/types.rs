use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::ClusterError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterRequest {
    #[serde(default)]
    pub features: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub cluster: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    pub scaler_path: String,
    pub model_path: String,
    pub feature_dim: usize,
}

impl EngineConfig {
    /// Defaults, then `config/cluster.toml` if present, then `STUDYMATCH_CLUSTER_*` env vars.
    pub fn load() -> Result<Self, ClusterError> {
        let config = config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:5001")?
            .set_default("scaler_path", "model/scaler.json")?
            .set_default("model_path", "model/kmeans_model.json")?
            .set_default("feature_dim", 62_i64)?
            .add_source(config::File::with_name("config/cluster").required(false))
            .add_source(config::Environment::with_prefix("STUDYMATCH_CLUSTER").try_parsing(true))
            .build()?
            .try_deserialize::<EngineConfig>()?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5001)),
            scaler_path: "model/scaler.json".to_string(),
            model_path: "model/kmeans_model.json".to_string(),
            feature_dim: 62,
        }
    }
}
