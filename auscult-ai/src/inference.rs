//! Diagnosis from a feature vector
//!
//! Scales the features, runs both classifiers and maps the random forest
//! label to advice. The forest is authoritative for the recommendation; the
//! CNN-LSTM label is reported alongside for information only.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::features::FeatureVector;
use crate::models::{Artifact, ModelError, ModelSet};
use crate::recommendation::recommendation_for;

/// Inference failures (all surface as server errors)
#[derive(Debug, Error)]
pub enum InferenceError {
    /// An artifact failed to load at startup
    #[error("{0} not loaded. Please check model files.")]
    MissingArtifact(Artifact),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Prediction result returned by `POST /predict`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub predicted_condition: String,
    pub recommendation: String,
    pub rf_prediction: String,
    pub cnn_lstm_prediction: String,
}

/// Run the full inference chain on one feature vector
pub fn diagnose(models: &ModelSet, features: &FeatureVector) -> Result<Diagnosis, InferenceError> {
    let scaler = models
        .scaler
        .as_ref()
        .ok_or(InferenceError::MissingArtifact(Artifact::FeatureScaler))?;
    let scaled = scaler.transform(features.as_slice())?;

    let forest = models
        .forest
        .as_ref()
        .ok_or(InferenceError::MissingArtifact(Artifact::RandomForest))?;
    let network = models
        .network
        .as_ref()
        .ok_or(InferenceError::MissingArtifact(Artifact::CnnLstm))?;
    let labels = models
        .labels
        .as_ref()
        .ok_or(InferenceError::MissingArtifact(Artifact::LabelEncoder))?;

    let rf_index = forest.predict(&scaled)?;
    let rf_prediction = labels.inverse_transform(rf_index)?.to_string();

    let cnn_index = network.predict(&scaled)?;
    let cnn_lstm_prediction = labels.inverse_transform(cnn_index)?.to_string();

    debug!(
        rf_index,
        cnn_index,
        rf = %rf_prediction,
        cnn_lstm = %cnn_lstm_prediction,
        "Predictions"
    );

    Ok(Diagnosis {
        recommendation: recommendation_for(&rf_prediction).to_string(),
        predicted_condition: rf_prediction.clone(),
        rf_prediction,
        cnn_lstm_prediction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forest::DecisionTree;
    use crate::models::{LabelEncoder, RandomForest, SequenceClassifier, StandardScaler};
    use crate::recommendation::DEFAULT_RECOMMENDATION;

    struct AlwaysClass(usize);

    impl SequenceClassifier for AlwaysClass {
        fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f32>, ModelError> {
            let mut proba = vec![0.0; 4];
            proba[self.0] = 1.0;
            Ok(proba)
        }
    }

    /// Single-leaf forest always voting for `class`
    fn constant_forest(class: usize) -> RandomForest {
        let mut value = vec![0.0; 4];
        value[class] = 1.0;
        RandomForest {
            n_classes: 4,
            n_features: 40,
            trees: vec![DecisionTree {
                children_left: vec![-1],
                children_right: vec![-1],
                feature: vec![-2],
                threshold: vec![-2.0],
                value: vec![value],
            }],
        }
    }

    fn complete_set(rf_class: usize, cnn_class: usize) -> ModelSet {
        ModelSet {
            forest: Some(constant_forest(rf_class)),
            network: Some(Box::new(AlwaysClass(cnn_class))),
            labels: Some(
                LabelEncoder::new(vec![
                    "Murmur".into(),
                    "Noisy".into(),
                    "Normal".into(),
                    "Artifact".into(),
                ])
                .unwrap(),
            ),
            scaler: Some(StandardScaler {
                mean: vec![0.0; 40],
                scale: vec![1.0; 40],
            }),
        }
    }

    fn features() -> FeatureVector {
        FeatureVector::from(vec![0.5; 40])
    }

    #[test]
    fn test_forest_drives_recommendation() {
        let diagnosis = diagnose(&complete_set(2, 0), &features()).unwrap();

        assert_eq!(diagnosis.predicted_condition, "Normal");
        assert_eq!(diagnosis.rf_prediction, "Normal");
        assert_eq!(diagnosis.cnn_lstm_prediction, "Murmur");
        assert_eq!(diagnosis.recommendation, recommendation_for("Normal"));
    }

    #[test]
    fn test_unknown_label_gets_default_advice() {
        let diagnosis = diagnose(&complete_set(3, 3), &features()).unwrap();
        assert_eq!(diagnosis.predicted_condition, "Artifact");
        assert_eq!(diagnosis.recommendation, DEFAULT_RECOMMENDATION);
    }

    #[test]
    fn test_missing_scaler_reported_first() {
        let set = ModelSet {
            scaler: None,
            forest: None,
            ..complete_set(0, 0)
        };
        let err = diagnose(&set, &features()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Feature scaler not loaded. Please check model files."
        );
    }

    #[test]
    fn test_missing_network_is_error() {
        let set = ModelSet {
            network: None,
            ..complete_set(0, 0)
        };
        assert!(matches!(
            diagnose(&set, &features()),
            Err(InferenceError::MissingArtifact(Artifact::CnnLstm))
        ));
    }

    #[test]
    fn test_label_out_of_range_is_model_error() {
        let mut set = complete_set(0, 0);
        set.labels = Some(LabelEncoder::new(vec!["Murmur".into()]).unwrap());
        set.network = Some(Box::new(AlwaysClass(2)));

        assert!(matches!(
            diagnose(&set, &features()),
            Err(InferenceError::Model(ModelError::UnknownClass(2)))
        ));
    }
}
