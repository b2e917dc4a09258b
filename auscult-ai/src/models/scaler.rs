//! Feature scaler (standardization parameters)

use std::path::Path;

use serde::Deserialize;

use super::{read_json, ModelError};

/// Per-feature `(x - mean) / scale` normalization from `feature_scaler.json`
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let scaler: Self = read_json(path)?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.mean.is_empty() {
            return Err(ModelError::Invalid("scaler has no features".to_string()));
        }
        if self.mean.len() != self.scale.len() {
            return Err(ModelError::Invalid(format!(
                "scaler mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one feature vector
    ///
    /// A zero scale is treated as 1 (constant features are only centered).
    pub fn transform(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        if features.len() != self.n_features() {
            return Err(ModelError::Shape {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&mean, &scale))| {
                let scale = if scale == 0.0 { 1.0 } else { scale };
                ((x as f64 - mean) / scale) as f32
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_standardizes() {
        let scaler = StandardScaler {
            mean: vec![1.0, -2.0, 0.5],
            scale: vec![2.0, 4.0, 0.0],
        };
        let out = scaler.transform(&[3.0, -2.0, 1.5]).unwrap();
        assert_eq!(out, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_transform_rejects_wrong_length() {
        let scaler = StandardScaler {
            mean: vec![0.0; 40],
            scale: vec![1.0; 40],
        };
        assert!(matches!(
            scaler.transform(&[0.0; 13]),
            Err(ModelError::Shape { expected: 40, actual: 13 })
        ));
    }

    #[test]
    fn test_mismatched_parameters_are_invalid() {
        let scaler = StandardScaler {
            mean: vec![0.0; 3],
            scale: vec![1.0; 2],
        };
        assert!(scaler.validate().is_err());
    }
}
