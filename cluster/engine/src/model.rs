use crate::error::ClusterError;
use crate::features::StandardScaler;
use crate::types::EngineConfig;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KMeansParams {
    pub cluster_centers: Vec<Vec<f64>>,
}

/// Trained centroids, one row per cluster.
#[derive(Clone, Debug)]
pub struct KMeans {
    centers: DMatrix<f64>,
}

impl KMeans {
    pub fn new(params: KMeansParams) -> Result<Self, ClusterError> {
        let k = params.cluster_centers.len();
        let dim = params.cluster_centers.first().map(Vec::len).unwrap_or(0);
        if k == 0 || dim == 0 {
            return Err(ClusterError::InvalidArtifact("model has no cluster centers".into()));
        }
        if params.cluster_centers.iter().any(|c| c.len() != dim) {
            return Err(ClusterError::InvalidArtifact(
                "cluster centers have differing dimensions".into(),
            ));
        }

        let flat: Vec<f64> = params.cluster_centers.into_iter().flatten().collect();
        if flat.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::InvalidArtifact(
                "cluster centers contain non-finite values".into(),
            ));
        }

        Ok(Self {
            centers: DMatrix::from_row_slice(k, dim, &flat),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClusterError> {
        let data = fs::read_to_string(path)?;
        let params: KMeansParams = serde_json::from_str(&data)?;
        Self::new(params)
    }

    pub fn n_clusters(&self) -> usize {
        self.centers.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.centers.ncols()
    }

    /// Index of the nearest center by squared Euclidean distance; ties go to the lower index.
    pub fn predict(&self, x: &DVector<f64>) -> Result<usize, ClusterError> {
        if x.len() != self.n_features() {
            return Err(ClusterError::Internal(format!(
                "scaled vector has {} dimensions, model expects {}",
                x.len(),
                self.n_features()
            )));
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, center) in self.centers.row_iter().enumerate() {
            let distance = (center.transpose() - x).norm_squared();
            if !distance.is_finite() {
                return Err(ClusterError::Internal(format!(
                    "distance to cluster {} is not finite",
                    index
                )));
            }
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((index, distance));
            }
        }

        best.map(|(index, _)| index)
            .ok_or_else(|| ClusterError::Internal("model has no cluster centers".into()))
    }
}

/// Scaler and centroids loaded together; the only state the service holds.
#[derive(Clone, Debug)]
pub struct ClusterModel {
    scaler: StandardScaler,
    kmeans: KMeans,
}

impl ClusterModel {
    pub fn new(scaler: StandardScaler, kmeans: KMeans, feature_dim: usize) -> Result<Self, ClusterError> {
        if scaler.n_features() != kmeans.n_features() {
            return Err(ClusterError::InvalidArtifact(format!(
                "scaler has {} features but cluster centers have {}",
                scaler.n_features(),
                kmeans.n_features()
            )));
        }
        if scaler.n_features() != feature_dim {
            return Err(ClusterError::InvalidArtifact(format!(
                "artifacts have {} features, configured for {}",
                scaler.n_features(),
                feature_dim
            )));
        }
        Ok(Self { scaler, kmeans })
    }

    pub fn load(config: &EngineConfig) -> Result<Self, ClusterError> {
        let scaler = StandardScaler::load(&config.scaler_path)?;
        let kmeans = KMeans::load(&config.model_path)?;
        let model = Self::new(scaler, kmeans, config.feature_dim)?;
        info!(
            "Loaded cluster model from {} and {}: {} clusters, {} features",
            config.scaler_path,
            config.model_path,
            model.n_clusters(),
            model.n_features()
        );
        Ok(model)
    }

    /// Validates and scales the vector, then returns the nearest cluster id.
    pub fn assign_cluster(&self, features: &[f64]) -> Result<usize, ClusterError> {
        let scaled = self.scaler.transform(features)?;
        self.kmeans.predict(&scaled)
    }

    pub fn n_clusters(&self) -> usize {
        self.kmeans.n_clusters()
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ScalerParams;
    use std::io::Write;

    fn identity_scaler(dim: usize) -> StandardScaler {
        StandardScaler::new(ScalerParams {
            mean: vec![0.0; dim],
            scale: vec![1.0; dim],
        })
        .unwrap()
    }

    fn kmeans(centers: Vec<Vec<f64>>) -> KMeans {
        KMeans::new(KMeansParams { cluster_centers: centers }).unwrap()
    }

    #[test]
    fn test_predict_nearest() {
        let model = kmeans(vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![-5.0, 5.0]]);
        assert_eq!(model.predict(&DVector::from_vec(vec![9.0, 8.0])).unwrap(), 1);
        assert_eq!(model.predict(&DVector::from_vec(vec![-4.0, 4.0])).unwrap(), 2);
        assert_eq!(model.predict(&DVector::from_vec(vec![0.5, -0.5])).unwrap(), 0);
    }

    #[test]
    fn test_ties_go_to_lower_index() {
        let model = kmeans(vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
        assert_eq!(model.predict(&DVector::from_vec(vec![0.0, 3.0])).unwrap(), 0);
    }

    #[test]
    fn test_rejects_ragged_centers() {
        let result = KMeans::new(KMeansParams {
            cluster_centers: vec![vec![0.0, 0.0], vec![1.0]],
        });
        assert!(matches!(result, Err(ClusterError::InvalidArtifact(_))));
    }

    #[test]
    fn test_rejects_empty_model() {
        let result = KMeans::new(KMeansParams { cluster_centers: vec![] });
        assert!(result.is_err());
    }

    #[test]
    fn test_scaling_applied_before_lookup() {
        // Unscaled, [4, 0] is nearest center 1; scaled by 10 it lands on center 0.
        let scaler = StandardScaler::new(ScalerParams {
            mean: vec![0.0, 0.0],
            scale: vec![10.0, 10.0],
        })
        .unwrap();
        let model = ClusterModel::new(scaler, kmeans(vec![vec![0.0, 0.0], vec![4.0, 0.0]]), 2).unwrap();
        assert_eq!(model.assign_cluster(&[4.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn test_dimension_checks_at_construction() {
        let result = ClusterModel::new(identity_scaler(3), kmeans(vec![vec![0.0, 0.0]]), 3);
        assert!(matches!(result, Err(ClusterError::InvalidArtifact(_))));

        let result = ClusterModel::new(identity_scaler(2), kmeans(vec![vec![0.0, 0.0]]), 62);
        assert!(matches!(result, Err(ClusterError::InvalidArtifact(_))));
    }

    #[test]
    fn test_wrong_length_input() {
        let model = ClusterModel::new(identity_scaler(2), kmeans(vec![vec![0.0, 0.0]]), 2).unwrap();
        let err = model.assign_cluster(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let model = ClusterModel::new(
            identity_scaler(2),
            kmeans(vec![vec![0.0, 0.0], vec![1.0, 1.0]]),
            2,
        )
        .unwrap();
        let first = model.assign_cluster(&[0.7, 0.4]).unwrap();
        for _ in 0..10 {
            assert_eq!(model.assign_cluster(&[0.7, 0.4]).unwrap(), first);
        }
    }

    #[test]
    fn test_load_from_files() {
        let mut scaler_file = tempfile::NamedTempFile::new().unwrap();
        write!(scaler_file, r#"{{"mean": [0.0, 0.0], "scale": [1.0, 1.0]}}"#).unwrap();
        let mut model_file = tempfile::NamedTempFile::new().unwrap();
        write!(model_file, r#"{{"cluster_centers": [[0.0, 0.0], [5.0, 5.0]]}}"#).unwrap();

        let config = EngineConfig {
            scaler_path: scaler_file.path().to_string_lossy().into_owned(),
            model_path: model_file.path().to_string_lossy().into_owned(),
            feature_dim: 2,
            ..EngineConfig::default()
        };

        let model = ClusterModel::load(&config).unwrap();
        assert_eq!(model.n_clusters(), 2);
        assert_eq!(model.assign_cluster(&[4.0, 6.0]).unwrap(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let config = EngineConfig {
            scaler_path: "missing/scaler.json".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(ClusterModel::load(&config), Err(ClusterError::Io(_))));
    }
}
