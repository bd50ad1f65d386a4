use crate::jobs::{ExtractJobCoordinator, ExtractJobType, ExtractionRequest, QueryError};
use crate::locator::{self, ArtifactLocator, LocatorError};
use crate::storage::traits::StoreError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for the query API
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ExtractJobCoordinator>,
    pub locator: Arc<ArtifactLocator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStreamRequest {
    pub extract_job_type: String,
    pub stream_id: String,
    #[serde(default)]
    pub log_event_idx: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ExtractStreamResponse {
    pub path: String,
    pub begin_msg_ix: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_signed_url: Option<String>,
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// POST /query/extract-stream
///
/// Resolves a log-event coordinate to extracted-stream metadata, submitting
/// an extraction job when no artifact covers it yet. When the artifact lives
/// in object storage and signing is enabled, a fresh pre-signed URL is
/// attached to the response.
pub async fn extract_stream(
    State(state): State<AppState>,
    Json(body): Json<ExtractStreamRequest>,
) -> Result<Json<ExtractStreamResponse>, ApiError> {
    let job_type = ExtractJobType::parse(&body.extract_job_type)
        .ok_or_else(|| QueryError::UnsupportedJobType(body.extract_job_type.clone()))?;

    let request = ExtractionRequest {
        job_type,
        stream_id: body.stream_id,
        log_event_idx: body.log_event_idx,
        timestamp: body.timestamp,
    };

    let metadata = state.coordinator.resolve(&request).await?;

    let pre_signed_url = if state.locator.is_enabled() && locator::is_object_uri(&metadata.path) {
        Some(state.locator.pre_signed_url(&metadata.path).await?)
    } else {
        None
    };

    Ok(Json(ExtractStreamResponse {
        path: metadata.path,
        begin_msg_ix: metadata.begin_msg_ix,
        pre_signed_url,
    }))
}

// Error handling
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    BadGateway(String),
    InternalError(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Store(StoreError::Unavailable(msg)) => {
                ApiError::BadGateway(format!("job store unavailable: {msg}"))
            }
            QueryError::Store(other) => ApiError::InternalError(other.to_string()),
            caller_error => ApiError::BadRequest(caller_error.to_string()),
        }
    }
}

impl From<LocatorError> for ApiError {
    fn from(err: LocatorError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
