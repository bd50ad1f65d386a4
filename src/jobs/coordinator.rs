use crate::jobs::{
    ArtifactMetadata, ExtractJobType, ExtractionRequest, JobConfig, JobId, JobState,
    EXTRACT_IR_TARGET_UNCOMPRESSED_SIZE, EXTRACT_JSON_TARGET_CHUNK_SIZE,
};
use crate::storage::traits::{JobStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Cap on the doubling poll backoff between job-state checks.
const POLL_BACKOFF_CAP: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid coordinate for {job_type}: {reason}")]
    InvalidCoordinate {
        job_type: &'static str,
        reason: String,
    },

    #[error("unsupported job type: {0}")]
    UnsupportedJobType(String),

    #[error("unable to extract stream with stream_id={stream_id} at log_event_idx={log_event_idx}")]
    ExtractionFailed {
        stream_id: String,
        log_event_idx: i64,
    },

    #[error("job store error: {0}")]
    Store(#[from] StoreError),
}

/// Resolves extraction requests against the job record store.
///
/// The coordinator deduplicates against already-extracted artifacts, submits
/// a type-specific job when none covers the coordinate, and waits (bounded)
/// for the execution system to finish it. Store errors always propagate as
/// `QueryError::Store`; they are never folded into `ExtractionFailed`.
pub struct ExtractJobCoordinator {
    store: Arc<dyn JobStore>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ExtractJobCoordinator {
    pub fn new(store: Arc<dyn JobStore>, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            store,
            poll_interval,
            max_wait,
        }
    }

    /// Resolves a request to artifact metadata, submitting and waiting for an
    /// extraction job if no existing artifact covers the coordinate.
    pub async fn resolve(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ArtifactMetadata, QueryError> {
        let msg_ix = validate_coordinate(request)?;

        if let Some(metadata) = self.store.find_artifact(&request.stream_id, msg_ix).await? {
            debug!(
                stream_id = %request.stream_id,
                msg_ix,
                path = %metadata.path,
                "Artifact already extracted, skipping submission"
            );
            return Ok(metadata);
        }

        let pending = self.submit(request).await?;
        pending.await_completion().await
    }

    /// Validates the request, builds the type-specific job config, and
    /// submits it. The returned handle acknowledges the submission; awaiting
    /// its completion is the second phase.
    pub async fn submit(
        &self,
        request: &ExtractionRequest,
    ) -> Result<PendingExtraction<'_>, QueryError> {
        let msg_ix = validate_coordinate(request)?;
        let config = build_job_config(request, msg_ix);
        let job_id = self.store.submit_job(request.job_type, config).await?;

        info!(
            job_id,
            job_type = request.job_type.as_str(),
            stream_id = %request.stream_id,
            msg_ix,
            "Submitted extraction job"
        );

        Ok(PendingExtraction {
            coordinator: self,
            job_id,
            stream_id: request.stream_id.clone(),
            msg_ix,
        })
    }
}

/// Acknowledgment of an accepted job submission. Awaiting completion polls
/// the store until the job reaches a terminal state or the wait budget is
/// exhausted.
pub struct PendingExtraction<'a> {
    coordinator: &'a ExtractJobCoordinator,
    job_id: JobId,
    stream_id: String,
    msg_ix: i64,
}

impl PendingExtraction<'_> {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub async fn await_completion(self) -> Result<ArtifactMetadata, QueryError> {
        let deadline = Instant::now() + self.coordinator.max_wait;
        let mut backoff = self.coordinator.poll_interval;

        loop {
            let state = self.coordinator.store.job_state(self.job_id).await?;
            match state {
                JobState::Succeeded => break,
                JobState::Failed | JobState::Cancelled => {
                    warn!(
                        job_id = self.job_id,
                        state = ?state,
                        stream_id = %self.stream_id,
                        "Extraction job ended without producing output"
                    );
                    return Err(self.extraction_failed());
                }
                JobState::Pending | JobState::Running => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(
                            job_id = self.job_id,
                            state = ?state,
                            stream_id = %self.stream_id,
                            "Gave up waiting for extraction job"
                        );
                        return Err(self.extraction_failed());
                    }
                    tokio::time::sleep(backoff.min(deadline - now)).await;
                    backoff = (backoff * 2).min(POLL_BACKOFF_CAP);
                }
            }
        }

        // The execution system may write artifact metadata after flipping the
        // job to Succeeded, so the lookup is the source of truth rather than
        // any result field on the job itself.
        match self
            .coordinator
            .store
            .find_artifact(&self.stream_id, self.msg_ix)
            .await?
        {
            Some(metadata) => Ok(metadata),
            None => {
                warn!(
                    job_id = self.job_id,
                    stream_id = %self.stream_id,
                    msg_ix = self.msg_ix,
                    "Job succeeded but no artifact covers the coordinate"
                );
                Err(self.extraction_failed())
            }
        }
    }

    fn extraction_failed(&self) -> QueryError {
        QueryError::ExtractionFailed {
            stream_id: self.stream_id.clone(),
            log_event_idx: self.msg_ix,
        }
    }
}

/// Checks the coordinate shape for the requested job type and returns the
/// message index used for artifact lookup and job anchoring.
fn validate_coordinate(request: &ExtractionRequest) -> Result<i64, QueryError> {
    match request.job_type {
        ExtractJobType::ExtractIr => {
            if request.timestamp.is_some() {
                return Err(QueryError::InvalidCoordinate {
                    job_type: "extract_ir",
                    reason: "a timestamp is not a valid anchor for IR extraction".to_string(),
                });
            }
            match request.log_event_idx {
                Some(ix) if ix >= 0 => Ok(ix),
                Some(ix) => Err(QueryError::InvalidCoordinate {
                    job_type: "extract_ir",
                    reason: format!("log event index {ix} is negative"),
                }),
                None => Err(QueryError::InvalidCoordinate {
                    job_type: "extract_ir",
                    reason: "a log event index is required".to_string(),
                }),
            }
        }
        ExtractJobType::ExtractJson => match (request.log_event_idx, request.timestamp) {
            (Some(ix), _) if ix < 0 => Err(QueryError::InvalidCoordinate {
                job_type: "extract_json",
                reason: format!("log event index {ix} is negative"),
            }),
            (Some(ix), _) => Ok(ix),
            // Archive + timestamp resolution always lands on the first record
            // of the produced chunk, so the anchor index defaults to 0.
            (None, Some(_)) => Ok(0),
            (None, None) => Err(QueryError::InvalidCoordinate {
                job_type: "extract_json",
                reason: "a timestamp or log event index is required".to_string(),
            }),
        },
    }
}

fn build_job_config(request: &ExtractionRequest, msg_ix: i64) -> JobConfig {
    match request.job_type {
        ExtractJobType::ExtractIr => JobConfig::ExtractIr {
            orig_file_id: request.stream_id.clone(),
            file_split_id: None,
            msg_ix,
            target_uncompressed_size: EXTRACT_IR_TARGET_UNCOMPRESSED_SIZE,
        },
        ExtractJobType::ExtractJson => JobConfig::ExtractJson {
            archive_id: request.stream_id.clone(),
            target_chunk_size: EXTRACT_JSON_TARGET_CHUNK_SIZE,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ir_request(stream_id: &str, log_event_idx: i64) -> ExtractionRequest {
        ExtractionRequest {
            job_type: ExtractJobType::ExtractIr,
            stream_id: stream_id.to_string(),
            log_event_idx: Some(log_event_idx),
            timestamp: None,
        }
    }

    #[test]
    fn test_index_zero_is_a_valid_coordinate() {
        assert_eq!(validate_coordinate(&ir_request("f1", 0)).unwrap(), 0);
    }

    #[test]
    fn test_negative_index_is_invalid() {
        let err = validate_coordinate(&ir_request("f1", -1)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_ir_request_rejects_timestamp_anchor() {
        let request = ExtractionRequest {
            job_type: ExtractJobType::ExtractIr,
            stream_id: "f1".to_string(),
            log_event_idx: Some(42),
            timestamp: Some(1_000_000),
        };
        assert!(matches!(
            validate_coordinate(&request),
            Err(QueryError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_json_request_anchors_at_zero_for_timestamp() {
        let request = ExtractionRequest {
            job_type: ExtractJobType::ExtractJson,
            stream_id: "a1".to_string(),
            log_event_idx: None,
            timestamp: Some(1_000_000),
        };
        assert_eq!(validate_coordinate(&request).unwrap(), 0);
    }

    #[test]
    fn test_json_request_without_any_coordinate_is_invalid() {
        let request = ExtractionRequest {
            job_type: ExtractJobType::ExtractJson,
            stream_id: "a1".to_string(),
            log_event_idx: None,
            timestamp: None,
        };
        assert!(matches!(
            validate_coordinate(&request),
            Err(QueryError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_ir_job_config_targets_fixed_chunk_size() {
        let request = ir_request("f1", 42);
        let config = build_job_config(&request, 42);
        assert_eq!(
            config,
            JobConfig::ExtractIr {
                orig_file_id: "f1".to_string(),
                file_split_id: None,
                msg_ix: 42,
                target_uncompressed_size: 128 * 1024 * 1024,
            }
        );
    }

    #[test]
    fn test_json_job_config_targets_fixed_record_count() {
        let request = ExtractionRequest {
            job_type: ExtractJobType::ExtractJson,
            stream_id: "a1".to_string(),
            log_event_idx: None,
            timestamp: Some(1_000_000),
        };
        let config = build_job_config(&request, 0);
        assert_eq!(
            config,
            JobConfig::ExtractJson {
                archive_id: "a1".to_string(),
                target_chunk_size: 100_000,
            }
        );
    }
}
