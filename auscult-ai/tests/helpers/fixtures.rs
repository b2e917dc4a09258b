//! Model and request fixtures
//!
//! Small hand-built artifacts with predictable outputs, so HTTP tests do not
//! depend on trained model files or on ONNX Runtime being installed.

use std::path::Path;

use auscult_ai::features::N_FEATURES;
use auscult_ai::models::forest::DecisionTree;
use auscult_ai::models::{
    LabelEncoder, ModelError, ModelSet, RandomForest, SequenceClassifier, StandardScaler,
};
use serde_json::json;

/// Classes in label-encoder order (alphabetical, as the encoder was fitted)
pub const TEST_CLASSES: [&str; 3] = ["Murmur", "Noisy", "Normal"];

pub fn test_labels() -> LabelEncoder {
    LabelEncoder::new(TEST_CLASSES.iter().map(|c| c.to_string()).collect()).unwrap()
}

/// Network stand-in that always votes for one class
pub struct FixedClassifier(pub usize);

impl SequenceClassifier for FixedClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        if features.len() != N_FEATURES {
            return Err(ModelError::Shape {
                expected: N_FEATURES,
                actual: features.len(),
            });
        }
        let mut proba = vec![0.05; TEST_CLASSES.len()];
        proba[self.0] = 0.9;
        Ok(proba)
    }
}

/// Single-leaf tree voting for `class`
fn leaf_tree(class: usize) -> DecisionTree {
    let mut value = vec![0.0; TEST_CLASSES.len()];
    value[class] = 10.0;
    DecisionTree {
        children_left: vec![-1],
        children_right: vec![-1],
        feature: vec![-2],
        threshold: vec![-2.0],
        value: vec![value],
    }
}

/// Every artifact present: forest votes `rf_class`, network votes `cnn_class`
pub fn complete_model_set(rf_class: usize, cnn_class: usize) -> ModelSet {
    ModelSet {
        forest: Some(RandomForest {
            n_classes: TEST_CLASSES.len(),
            n_features: N_FEATURES,
            trees: vec![leaf_tree(rf_class), leaf_tree(rf_class)],
        }),
        network: Some(Box::new(FixedClassifier(cnn_class))),
        labels: Some(test_labels()),
        scaler: Some(StandardScaler {
            mean: vec![0.0; N_FEATURES],
            scale: vec![1.0; N_FEATURES],
        }),
    }
}

/// Write the three JSON artifacts into `dir`
///
/// The forest splits on feature 0 at 0.0: `<=` goes to "Normal", `>` to
/// "Murmur".
pub fn write_json_artifacts(dir: &Path) -> anyhow::Result<()> {
    let forest = json!({
        "n_classes": 3,
        "n_features": N_FEATURES,
        "trees": [{
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [0.0, -2.0, -2.0],
            "value": [[4.0, 0.0, 4.0], [0.0, 0.0, 4.0], [4.0, 0.0, 0.0]]
        }]
    });
    let labels = json!({ "classes": TEST_CLASSES });
    let scaler = json!({
        "mean": vec![0.0; N_FEATURES],
        "scale": vec![1.0; N_FEATURES],
    });

    std::fs::write(
        dir.join("random_forest_model.json"),
        serde_json::to_vec(&forest)?,
    )?;
    std::fs::write(dir.join("label_encoder.json"), serde_json::to_vec(&labels)?)?;
    std::fs::write(dir.join("feature_scaler.json"), serde_json::to_vec(&scaler)?)?;
    Ok(())
}

/// One part of a hand-built multipart body
pub struct MultipartPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content: &'a [u8],
}

const BOUNDARY: &str = "auscult-test-boundary-7MA4YWxkTrZu0gW";

/// Encode `parts` as `multipart/form-data`
///
/// Returns the `content-type` header value and the body.
pub fn multipart_body(parts: &[MultipartPart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
