pub mod error;
pub mod features;
pub mod metrics;
pub mod model;
pub mod routes;
pub mod types;

pub use model::ClusterModel;
pub use routes::{create_router, AppState};
