use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrostError {
    #[error("model file not found at {}; place the exported forest there and restart", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("failed to load model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("file is missing required columns: {}", missing.join(", "))]
    ColumnMissing { missing: Vec<String> },

    #[error("file parse error: {0}")]
    FileParse(String),

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upload too large: {0}")]
    UploadTooLarge(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrostError>;

impl FrostError {
    pub fn code(&self) -> &'static str {
        match self {
            FrostError::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            FrostError::ModelLoad { .. } => "MODEL_LOAD_ERROR",
            FrostError::ColumnMissing { .. } => "COLUMN_MISSING",
            FrostError::FileParse(_) => "FILE_PARSE_ERROR",
            FrostError::Prediction(_) => "PREDICTION_ERROR",
            FrostError::InvalidInput(_) => "INVALID_INPUT",
            FrostError::UploadTooLarge(_) => "UPLOAD_TOO_LARGE",
            FrostError::Io(_) => "IO_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            FrostError::ModelNotFound { .. } | FrostError::ModelLoad { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            FrostError::ColumnMissing { .. }
            | FrostError::Prediction(_)
            | FrostError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FrostError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            FrostError::FileParse(_) => StatusCode::BAD_REQUEST,
            FrostError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Model errors block every flow; the service keeps answering with them.
    pub fn is_model_error(&self) -> bool {
        matches!(self, FrostError::ModelNotFound { .. } | FrostError::ModelLoad { .. })
    }
}

impl IntoResponse for FrostError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!("request failed code={} err={}", self.code(), self);
        let body = Json(json!({ "code": self.code(), "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
