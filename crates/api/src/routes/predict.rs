//! Prediction Route

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use data_validator::PredictRequest;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ApiError;
use crate::SharedState;

/// Response for the prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted age in rings
    pub prediction: u32,
}

/// Predict the age of one abalone
pub async fn predict(
    State(state): State<SharedState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = payload?;

    let record = state.validator.validate(&request).map_err(|report| {
        counter!("abalone_validation_failures_total").increment(1);
        report
    })?;

    let start = Instant::now();
    let prediction = state.pipeline.predict(&record).map_err(|e| {
        counter!("abalone_prediction_failures_total", "stage" => e.stage()).increment(1);
        e
    })?;
    let elapsed = start.elapsed();

    histogram!("abalone_prediction_latency_seconds").record(elapsed.as_secs_f64());
    counter!("abalone_predictions_total").increment(1);
    debug!(
        "Prediction for sex={} -> {} rings (raw={:.4})",
        record.sex, prediction.rings, prediction.raw
    );

    Ok(Json(PredictResponse {
        prediction: prediction.rings,
    }))
}
