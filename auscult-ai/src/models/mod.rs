//! Pretrained model artifacts
//!
//! Four artifacts are produced offline and loaded once at startup:
//!
//! | Artifact | File |
//! |---|---|
//! | Random forest (tree ensemble) | `random_forest_model.json` |
//! | CNN-LSTM (neural sequence model) | `cnn_lstm_model.onnx` |
//! | Label encoder | `label_encoder.json` |
//! | Feature scaler | `feature_scaler.json` |
//!
//! Each artifact loads independently. A missing or corrupt file is logged and
//! leaves that slot empty; the service still starts and requests needing the
//! artifact fail at prediction time.

pub mod forest;
pub mod label_encoder;
pub mod network;
pub mod scaler;

pub use forest::RandomForest;
pub use label_encoder::LabelEncoder;
pub use network::{OnnxClassifier, SequenceClassifier};
pub use scaler::StandardScaler;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Errors raised while loading or evaluating an artifact
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact content is structurally inconsistent
    #[error("Invalid artifact: {0}")]
    Invalid(String),

    /// Input length does not match what the artifact expects
    #[error("Expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// Class index has no entry in the label encoder
    #[error("Class index {0} is not known to the label encoder")]
    UnknownClass(usize),

    /// Neural network runtime failure
    #[error("Inference runtime error: {0}")]
    Runtime(String),
}

/// The four artifact slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    RandomForest,
    CnnLstm,
    LabelEncoder,
    FeatureScaler,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::RandomForest,
        Artifact::CnnLstm,
        Artifact::LabelEncoder,
        Artifact::FeatureScaler,
    ];

    /// File name inside the models directory
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::RandomForest => "random_forest_model.json",
            Artifact::CnnLstm => "cnn_lstm_model.onnx",
            Artifact::LabelEncoder => "label_encoder.json",
            Artifact::FeatureScaler => "feature_scaler.json",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Artifact::RandomForest => "Random forest model",
            Artifact::CnnLstm => "CNN-LSTM model",
            Artifact::LabelEncoder => "Label encoder",
            Artifact::FeatureScaler => "Feature scaler",
        };
        f.write_str(name)
    }
}

/// Read-only set of loaded artifacts, shared by all requests
#[derive(Default)]
pub struct ModelSet {
    pub forest: Option<RandomForest>,
    pub network: Option<Box<dyn SequenceClassifier>>,
    pub labels: Option<LabelEncoder>,
    pub scaler: Option<StandardScaler>,
}

/// Which artifacts are available (reported by `/health`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub random_forest: bool,
    pub cnn_lstm: bool,
    pub label_encoder: bool,
    pub feature_scaler: bool,
}

impl ModelStatus {
    pub fn all_loaded(&self) -> bool {
        self.random_forest && self.cnn_lstm && self.label_encoder && self.feature_scaler
    }
}

impl ModelSet {
    /// Load every artifact from `dir`, logging (not propagating) failures
    pub fn load(dir: &Path) -> Self {
        info!(models_dir = %dir.display(), "Loading model artifacts");

        let set = Self {
            forest: load_logged(dir, Artifact::RandomForest, RandomForest::load),
            network: load_logged(dir, Artifact::CnnLstm, |path| {
                OnnxClassifier::load(path).map(|c| Box::new(c) as Box<dyn SequenceClassifier>)
            }),
            labels: load_logged(dir, Artifact::LabelEncoder, LabelEncoder::load),
            scaler: load_logged(dir, Artifact::FeatureScaler, StandardScaler::load),
        };

        if let Some(labels) = &set.labels {
            info!("Label encoder classes: {:?}", labels.classes());
        }
        if set.status().all_loaded() {
            info!("Models loaded successfully");
        } else {
            error!(
                "Some models failed to load; ensure artifacts are present in {}",
                dir.display()
            );
        }

        set
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            random_forest: self.forest.is_some(),
            cnn_lstm: self.network.is_some(),
            label_encoder: self.labels.is_some(),
            feature_scaler: self.scaler.is_some(),
        }
    }
}

fn load_logged<T>(
    dir: &Path,
    artifact: Artifact,
    load: impl FnOnce(&Path) -> Result<T, ModelError>,
) -> Option<T> {
    let path = dir.join(artifact.file_name());
    match load(&path) {
        Ok(value) => {
            info!(path = %path.display(), "{} loaded", artifact);
            Some(value)
        }
        Err(e) => {
            error!(path = %path.display(), "Error loading {}: {}", artifact, e);
            None
        }
    }
}

/// Read and deserialize a JSON artifact
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Index of the largest value; lowest index wins ties, NaN never wins
pub(crate) fn argmax<T: PartialOrd + Copy>(values: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.partial_cmp(&v).is_none() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5, 0.1]), Some(1));
        assert_eq!(argmax(&[3u32]), Some(0));
        assert_eq!(argmax::<f32>(&[]), None);
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.1, 0.3]), Some(2));
        assert_eq!(argmax(&[f32::NAN]), None);
    }

    #[test]
    fn test_artifact_display_matches_error_text() {
        assert_eq!(Artifact::FeatureScaler.to_string(), "Feature scaler");
        assert_eq!(Artifact::CnnLstm.file_name(), "cnn_lstm_model.onnx");
    }

    #[test]
    fn test_empty_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let set = ModelSet::load(dir.path());
        let status = set.status();
        assert!(!status.random_forest);
        assert!(!status.cnn_lstm);
        assert!(!status.label_encoder);
        assert!(!status.feature_scaler);
        assert!(!status.all_loaded());
    }
}
