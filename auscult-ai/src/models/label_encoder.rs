//! Label encoder (class index to class name)

use std::path::Path;

use serde::Deserialize;

use super::{read_json, ModelError};

/// Class names from `label_encoder.json`; index `i` maps to `classes[i]`
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ModelError> {
        let encoder = Self { classes };
        encoder.validate()?;
        Ok(encoder)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let encoder: Self = read_json(path)?;
        encoder.validate()?;
        Ok(encoder)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::Invalid("label encoder has no classes".to_string()));
        }
        Ok(())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Class name for an encoded index
    pub fn inverse_transform(&self, index: usize) -> Result<&str, ModelError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(ModelError::UnknownClass(index))
    }
}
