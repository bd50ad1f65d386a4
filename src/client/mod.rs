use crate::jobs::ExtractJobType;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};
use url::Url;

const UNKNOWN_ERROR_MSG: &str = "Unknown error.";

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Loading states of one redirect flow.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Submitting,
    Waiting,
    Loading,
    Navigated(String),
    Errored(String),
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Navigated(_) | Self::Errored(_))
    }
}

/// Coordinate parsed from a viewer deep link.
#[derive(Debug, Clone, PartialEq)]
pub enum DeepLinkCoordinate {
    OrigFile {
        orig_file_id: String,
        log_event_idx: i64,
    },
    Archive {
        archive_id: String,
        timestamp: i64,
    },
}

/// Why a deep link could not yield a coordinate.
#[derive(Debug, Error, PartialEq)]
pub enum DeepLinkError {
    #[error("query parameters are missing from the URL")]
    MissingParameters,

    #[error("query parameter {name} has a malformed value '{value}'")]
    MalformedValue { name: &'static str, value: String },
}

/// Extracts the coordinate from a deep link's query parameters. Exactly one
/// of the two shapes must be present: origFileId + logEventIdx, or
/// archiveId + timestamp. A pair whose numeric value does not parse is
/// reported as malformed, not missing.
pub fn parse_deep_link(link: &str) -> Result<DeepLinkCoordinate, DeepLinkError> {
    let url = Url::parse(link).map_err(|_| DeepLinkError::MissingParameters)?;

    let mut orig_file_id = None;
    let mut log_event_idx = None;
    let mut archive_id = None;
    let mut timestamp = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "origFileId" => orig_file_id = Some(value.to_string()),
            "logEventIdx" => log_event_idx = Some(value.to_string()),
            "archiveId" => archive_id = Some(value.to_string()),
            "timestamp" => timestamp = Some(value.to_string()),
            _ => {}
        }
    }

    if let (Some(orig_file_id), Some(idx)) = (orig_file_id, log_event_idx) {
        return Ok(DeepLinkCoordinate::OrigFile {
            orig_file_id,
            log_event_idx: parse_numeric("logEventIdx", &idx)?,
        });
    }
    if let (Some(archive_id), Some(ts)) = (archive_id, timestamp) {
        return Ok(DeepLinkCoordinate::Archive {
            archive_id,
            timestamp: parse_numeric("timestamp", &ts)?,
        });
    }
    Err(DeepLinkError::MissingParameters)
}

fn parse_numeric(name: &'static str, value: &str) -> Result<i64, DeepLinkError> {
    value.parse().map_err(|_| DeepLinkError::MalformedValue {
        name,
        value: value.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct ExtractStreamResult {
    path: String,
    begin_msg_ix: i64,
    #[serde(default)]
    pre_signed_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Drives one deep link to a terminal state: parse the coordinate, submit
/// the extraction query, and compute the viewer URL to navigate to.
///
/// State transitions (Submitting -> Waiting -> Loading -> terminal) are
/// published on a watch channel for observers. `run` consumes the driver, so
/// a flow cannot be re-triggered; failures are surfaced once and require a
/// fresh link.
pub struct RedirectDriver {
    client: reqwest::Client,
    server_base_url: String,
    viewer_url_prefix: String,
    state_tx: watch::Sender<QueryState>,
    state_rx: watch::Receiver<QueryState>,
}

impl RedirectDriver {
    pub fn new(
        server_base_url: impl Into<String>,
        viewer_url_prefix: impl Into<String>,
    ) -> Result<Self, DriverError> {
        let client = reqwest::Client::builder().build()?;
        let (state_tx, state_rx) = watch::channel(QueryState::Submitting);

        Ok(Self {
            client,
            server_base_url: server_base_url.into(),
            viewer_url_prefix: viewer_url_prefix.into(),
            state_tx,
            state_rx,
        })
    }

    /// Channel observers can watch for state transitions.
    pub fn states(&self) -> watch::Receiver<QueryState> {
        self.state_rx.clone()
    }

    pub async fn run(self, deep_link: &str) -> QueryState {
        let coordinate = match parse_deep_link(deep_link) {
            Ok(coordinate) => coordinate,
            Err(e) => {
                error!(deep_link, cause = %e, "Deep link rejected");
                return self.finish(QueryState::Errored(e.to_string()));
            }
        };

        let body = match &coordinate {
            DeepLinkCoordinate::OrigFile {
                orig_file_id,
                log_event_idx,
            } => serde_json::json!({
                "extractJobType": ExtractJobType::ExtractIr.as_str(),
                "streamId": orig_file_id,
                "logEventIdx": log_event_idx,
            }),
            DeepLinkCoordinate::Archive {
                archive_id,
                timestamp,
            } => serde_json::json!({
                "extractJobType": ExtractJobType::ExtractJson.as_str(),
                "streamId": archive_id,
                "logEventIdx": 0,
                "timestamp": timestamp,
            }),
        };

        let url = format!("{}/query/extract-stream", self.server_base_url);
        let request = self.client.post(&url).json(&body);

        // Request dispatched; the server is now waiting on job execution
        self.set_state(QueryState::Waiting);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Extraction query failed to send");
                return self.finish(QueryState::Errored(e.to_string()));
            }
        };

        if !response.status().is_success() {
            let msg = extract_error_message(response).await;
            error!(cause = %msg, "Extraction query was rejected");
            return self.finish(QueryState::Errored(msg));
        }

        self.set_state(QueryState::Loading);

        let metadata: ExtractStreamResult = match response.json().await {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(error = %e, "Malformed extraction response");
                return self.finish(QueryState::Errored(e.to_string()));
            }
        };

        // 1-based position of the requested event within the artifact
        let inner_log_event_num = match &coordinate {
            DeepLinkCoordinate::OrigFile { log_event_idx, .. } => {
                log_event_idx - metadata.begin_msg_ix + 1
            }
            // Archive + timestamp resolution lands on the artifact's first record
            DeepLinkCoordinate::Archive { .. } => 1,
        };

        let file_path = metadata
            .pre_signed_url
            .unwrap_or_else(|| format!("/ir/{}", metadata.path));
        let target = viewer_target(&self.viewer_url_prefix, &file_path, inner_log_event_num);

        info!(url = %target, "Navigating to extracted stream");
        self.finish(QueryState::Navigated(target))
    }

    fn set_state(&self, state: QueryState) {
        let _ = self.state_tx.send(state);
    }

    fn finish(self, state: QueryState) -> QueryState {
        let _ = self.state_tx.send(state.clone());
        state
    }
}

/// Builds the viewer URL for a resolved stream. The file path is
/// form-encoded as a query value so a pre-signed URL's own query string
/// survives inside `filePath` instead of splitting it at the first `&`.
fn viewer_target(prefix: &str, file_path: &str, log_event_num: i64) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("filePath", file_path)
        .finish();
    format!("{prefix}?{query}#logEventNum={log_event_num}")
}

/// Prefers the structured server-provided message, then the HTTP status
/// text, then a generic fallback.
async fn extract_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody { message: Some(msg) }) => msg,
        _ => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_ERROR_MSG.to_string()),
    }
}
