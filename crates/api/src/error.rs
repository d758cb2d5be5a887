//! HTTP error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationReport;
use inference_engine::PipelineError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned from request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body could not be read as the request schema
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
    /// Body parsed but fields failed validation
    #[error("Request validation failed: {0}")]
    Validation(#[from] ValidationReport),
    /// Pipeline rejected the record or the model failed
    #[error("Prediction failed: {0}")]
    Pipeline(#[from] PipelineError),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: Vec<String>,
}

impl ApiError {
    /// Status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(PipelineError::Prediction(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Body(rejection) => ErrorBody {
                error: "Invalid request body".to_string(),
                details: vec![rejection.body_text()],
            },
            ApiError::Validation(report) => ErrorBody {
                error: "Validation failed".to_string(),
                details: report.messages(),
            },
            ApiError::Pipeline(e) => ErrorBody {
                error: format!("Prediction failed at {} stage", e.stage()),
                details: vec![e.to_string()],
            },
        };

        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, Json(body)).into_response()
    }
}
