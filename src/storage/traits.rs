use crate::jobs::{ArtifactMetadata, ExtractJobType, JobConfig, JobId, JobState};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job store unavailable: {0}")]
    Unavailable(String),

    #[error("job {0} not found")]
    JobNotFound(JobId),
}

/// Narrow interface over the external job record store.
///
/// The gateway only creates jobs, reads their state, and looks up extracted
/// artifacts; state transitions belong to the execution system. "No artifact
/// covers the coordinate" is a valid `None`, never an error.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new job record in the Pending state and returns its id.
    async fn submit_job(
        &self,
        job_type: ExtractJobType,
        config: JobConfig,
    ) -> Result<JobId, StoreError>;

    /// Reads the current state of a job.
    async fn job_state(&self, job_id: JobId) -> Result<JobState, StoreError>;

    /// Looks up extracted-stream metadata covering (stream_id, msg_ix).
    async fn find_artifact(
        &self,
        stream_id: &str,
        msg_ix: i64,
    ) -> Result<Option<ArtifactMetadata>, StoreError>;
}
