use crate::batch::{self, EXPORT_FILE_NAME};
use crate::classifier::Classifier;
use crate::error::{FrostError, Result};
use crate::single::{self, SingleInput, Verdict};
use crate::types::{BatchOut, FormInfo, Health};
use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

// ---------- Server state ----------

/// Loaded once at startup. A failed load is kept so every request can
/// report it instead of predicting with nothing.
#[derive(Clone)]
pub enum ModelHandle {
    Ready(Arc<dyn Classifier>),
    Unavailable(Arc<FrostError>),
}

#[derive(Clone)]
pub struct AppState {
    model: ModelHandle,
    log_predictions: bool,
}

impl AppState {
    pub fn new(model: Result<Arc<dyn Classifier>>, log_predictions: bool) -> Self {
        let model = match model {
            Ok(m) => ModelHandle::Ready(m),
            Err(e) => ModelHandle::Unavailable(Arc::new(e)),
        };
        Self {
            model,
            log_predictions,
        }
    }

    fn classifier(&self) -> Result<Arc<dyn Classifier>> {
        match &self.model {
            ModelHandle::Ready(m) => Ok(Arc::clone(m)),
            ModelHandle::Unavailable(err) => Err(blocking_error(err)),
        }
    }
}

fn blocking_error(err: &FrostError) -> FrostError {
    match err {
        FrostError::ModelNotFound { path } => FrostError::ModelNotFound { path: path.clone() },
        FrostError::ModelLoad { path, reason } => FrostError::ModelLoad {
            path: path.clone(),
            reason: reason.clone(),
        },
        other => FrostError::ModelLoad {
            path: Default::default(),
            reason: other.to_string(),
        },
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/form", get(form))
        .route("/api/predict", post(predict))
        .route("/api/batch", post(batch_json))
        .route("/api/batch/export", post(batch_export))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

// ---------- Handlers ----------

async fn health(State(state): State<AppState>) -> Json<Health> {
    let (model, error) = match &state.model {
        ModelHandle::Ready(_) => ("ready", None),
        ModelHandle::Unavailable(e) => ("unavailable", Some(e.to_string())),
    };
    Json(Health {
        status: "ok",
        model,
        error,
    })
}

async fn form() -> Json<FormInfo> {
    Json(FormInfo::default())
}

async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SingleInput>, JsonRejection>,
) -> Result<Json<Verdict>> {
    // A missing model outranks a malformed body.
    let model = state.classifier()?;
    let Json(input) = payload.map_err(|e| FrostError::InvalidInput(e.body_text()))?;
    let verdict = single::submit(model.as_ref(), &input)?;

    if state.log_predictions {
        tracing::info!(
            "predict features={:?} p={:.4} label={:?}",
            input.record().to_vector(),
            verdict.frost_probability,
            verdict.label
        );
    }
    Ok(Json(verdict))
}

async fn batch_json(State(state): State<AppState>, multipart: Multipart) -> Result<Json<BatchOut>> {
    let model = state.classifier()?;
    let (name, bytes) = read_upload(multipart).await?;
    let res = batch::process_batch(model.as_ref(), &name, &bytes)?;
    tracing::info!("batch ok file={} rows={} frost={}", name, res.predictions.len(), res.frost_count());
    Ok(Json(res.into()))
}

async fn batch_export(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let model = state.classifier()?;
    let (name, bytes) = read_upload(multipart).await?;
    let res = batch::process_batch(model.as_ref(), &name, &bytes)?;
    let csv = res.export_csv()?;
    tracing::info!("batch export file={} rows={} bytes={}", name, res.predictions.len(), csv.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(EXPORT_FILE_NAME)),
        ],
        csv,
    )
        .into_response())
}

// ---------- Upload helpers ----------

/// First field named `file` (or carrying a file name): (file name, bytes).
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| FrostError::FileParse("uploaded file has no name".into()))?;
        let bytes = field.bytes().await.map_err(upload_error)?;
        return Ok((name, bytes.to_vec()));
    }
    Err(FrostError::FileParse("no file uploaded".into()))
}

fn upload_error(e: MultipartError) -> FrostError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FrostError::UploadTooLarge(e.body_text())
    } else {
        FrostError::FileParse(e.body_text())
    }
}

/// ASCII fallback plus RFC 5987 UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let mut encoded = String::new();
    for b in file_name.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    format!(
        "attachment; filename=\"frost_predictions.csv\"; filename*=UTF-8''{}",
        encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_encodes_utf8() {
        let v = content_disposition("预测结果.csv");
        assert!(v.starts_with("attachment; filename=\"frost_predictions.csv\""));
        assert!(v.ends_with("filename*=UTF-8''%E9%A2%84%E6%B5%8B%E7%BB%93%E6%9E%9C.csv"));
    }

    #[test]
    fn test_unavailable_model_blocks() {
        let state = AppState::new(
            Err(FrostError::ModelNotFound {
                path: "frost_prediction_model.json".into(),
            }),
            false,
        );
        let err = state.classifier().err().unwrap();
        assert_eq!(err.code(), "MODEL_NOT_FOUND");
    }
}
