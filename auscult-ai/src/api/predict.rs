//! Prediction endpoint
//!
//! POST /predict with a multipart field named `audio`

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    features::{extract_features, FeatureError, MfccConfig},
    inference::{diagnose, Diagnosis, InferenceError},
    upload::TempUpload,
    AppState,
};

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

pub const MSG_NO_AUDIO: &str = "No audio file provided";
pub const MSG_NO_SELECTED_FILE: &str = "No selected file";
pub const MSG_EMPTY_FILE: &str = "Uploaded audio file is empty";
pub const MSG_EXTRACTION_FAILED: &str =
    "Could not extract features from audio or audio file is corrupt.";

/// Where a blocking prediction stopped
enum PredictFailure {
    Extraction(FeatureError),
    Inference(InferenceError),
}

/// File part of the `audio` field
struct AudioPart {
    file_name: String,
    bytes: axum::body::Bytes,
}

/// POST /predict
///
/// Stores the upload, then on a blocking worker extracts features, deletes the
/// upload and runs both classifiers. The upload is removed before any model
/// is consulted, whatever the extraction outcome.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Diagnosis>> {
    let mut multipart =
        multipart.map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;

    let part = read_audio_part(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest(MSG_NO_AUDIO.to_string()))?;
    if part.file_name.is_empty() {
        return Err(ApiError::BadRequest(MSG_NO_SELECTED_FILE.to_string()));
    }
    if part.bytes.is_empty() {
        return Err(ApiError::BadRequest(MSG_EMPTY_FILE.to_string()));
    }

    info!(file_name = %part.file_name, bytes = part.bytes.len(), "Prediction request");

    let upload = TempUpload::persist(&state.upload_dir, &part.file_name, &part.bytes).await?;

    // CPU-bound: decode + resample + MFCC + both classifiers
    let models = Arc::clone(&state.models);
    let outcome = tokio::task::spawn_blocking(move || {
        let extraction = extract_features(upload.path(), &MfccConfig::default());
        upload.remove();
        let features = extraction.map_err(PredictFailure::Extraction)?;
        diagnose(&models, &features).map_err(PredictFailure::Inference)
    })
    .await;

    let diagnosis = match outcome {
        Ok(Ok(diagnosis)) => diagnosis,
        Ok(Err(PredictFailure::Extraction(e))) => {
            warn!(file_name = %part.file_name, "Feature extraction failed: {}", e);
            return Err(ApiError::Internal(MSG_EXTRACTION_FAILED.to_string()));
        }
        Ok(Err(PredictFailure::Inference(e))) => return Err(e.into()),
        Err(e) => {
            warn!(file_name = %part.file_name, "Prediction task failed: {}", e);
            return Err(ApiError::Internal(MSG_EXTRACTION_FAILED.to_string()));
        }
    };

    info!(
        predicted_condition = %diagnosis.predicted_condition,
        cnn_lstm_prediction = %diagnosis.cnn_lstm_prediction,
        "Prediction complete"
    );

    Ok(Json(diagnosis))
}

/// Find the first `audio` field that carries a file
///
/// A plain (non-file) form field named `audio` does not count as an upload.
async fn read_audio_part(multipart: &mut Multipart) -> ApiResult<Option<AudioPart>> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
        let Some(field) = field else {
            return Ok(None);
        };

        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;

        return Ok(Some(AudioPart { file_name, bytes }));
    }
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}
