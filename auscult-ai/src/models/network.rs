//! Neural sequence classifier (CNN-LSTM)
//!
//! The network is exported to ONNX and executed with ONNX Runtime (`ort`).
//! Input is the scaled feature vector reshaped to `[batch = 1, 40 steps,
//! 1 channel]`; output is one probability per class.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array3;
use ort::session::Session;
use ort::value::Tensor;

use super::{argmax, ModelError};

/// A classifier producing class probabilities for one feature vector
pub trait SequenceClassifier: Send + Sync {
    /// Class probabilities (or scores) for `features`
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, ModelError>;

    /// Predicted class index (argmax of [`predict_proba`](Self::predict_proba))
    fn predict(&self, features: &[f32]) -> Result<usize, ModelError> {
        let proba = self.predict_proba(features)?;
        argmax(&proba)
            .ok_or_else(|| ModelError::Runtime("model produced no class scores".to_string()))
    }
}

/// CNN-LSTM classifier backed by an ONNX Runtime session
///
/// `Session::run` needs `&mut self`, so the session sits behind a mutex;
/// concurrent requests take turns on the network.
pub struct OnnxClassifier {
    session: Mutex<Session>,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| ModelError::Runtime(format!("Failed to load {}: {}", path.display(), e)))?;

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl SequenceClassifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        let input = Array3::from_shape_vec((1, features.len(), 1), features.to_vec())
            .map_err(|e| ModelError::Runtime(format!("input shape error: {}", e)))?;
        let input_tensor = Tensor::from_array(input)
            .map_err(|e| ModelError::Runtime(format!("tensor creation error: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Runtime("session mutex poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Runtime(format!("inference error: {}", e)))?;

        let (_, first_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| ModelError::Runtime("model produced no output".to_string()))?;
        let (_shape, probs) = first_value
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Runtime(format!("output extraction error: {}", e)))?;

        Ok(probs.to_vec())
    }
}
