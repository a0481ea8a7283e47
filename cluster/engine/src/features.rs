use crate::error::ClusterError;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Per-dimension standardisation learned at training time: `(x - mean) / scale`.
#[derive(Clone, Debug)]
pub struct StandardScaler {
    mean: DVector<f64>,
    scale: DVector<f64>,
}

impl StandardScaler {
    pub fn new(params: ScalerParams) -> Result<Self, ClusterError> {
        if params.mean.is_empty() {
            return Err(ClusterError::InvalidArtifact("scaler has no features".into()));
        }
        if params.mean.len() != params.scale.len() {
            return Err(ClusterError::InvalidArtifact(format!(
                "scaler mean has {} entries but scale has {}",
                params.mean.len(),
                params.scale.len()
            )));
        }
        if params.mean.iter().chain(&params.scale).any(|v| !v.is_finite()) {
            return Err(ClusterError::InvalidArtifact("scaler contains non-finite values".into()));
        }

        // Constant features were fitted with zero spread; leave them unscaled.
        let scale: Vec<f64> = params
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            mean: DVector::from_vec(params.mean),
            scale: DVector::from_vec(scale),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClusterError> {
        let data = fs::read_to_string(path)?;
        let params: ScalerParams = serde_json::from_str(&data)?;
        Self::new(params)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, features: &[f64]) -> Result<DVector<f64>, ClusterError> {
        if features.len() != self.n_features() {
            return Err(ClusterError::DimensionMismatch {
                got: features.len(),
                expected: self.n_features(),
            });
        }
        if let Some(position) = features.iter().position(|v| !v.is_finite()) {
            return Err(ClusterError::BadRequest(format!(
                "feature {} is not a finite number",
                position
            )));
        }

        let x = DVector::from_column_slice(features);
        let scaled = (x - &self.mean).component_div(&self.scale);
        if let Some(position) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(ClusterError::BadRequest(format!(
                "feature {} is out of range after scaling",
                position
            )));
        }
        Ok(scaled)
    }
}
