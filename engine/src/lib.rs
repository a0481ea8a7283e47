//! Similarity matching service: ranks the closest study peers for a named
//! student using TF-IDF vectors over a fixed roster.

pub mod config;
pub mod error;
pub mod features;
pub mod roster;
pub mod routes;
pub mod similarity;
pub mod types;

pub use routes::{create_router, AppState};
pub use similarity::MatchEngine;
