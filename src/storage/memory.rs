use super::traits::{JobStore, StoreError};
use crate::jobs::{ArtifactMetadata, ExtractJobType, JobConfig, JobId, JobState};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// A job record as held by the in-memory store.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_type: ExtractJobType,
    pub config: JobConfig,
    pub state: JobState,
}

#[derive(Debug, Clone)]
struct StoredArtifact {
    stream_id: String,
    begin_msg_ix: i64,
    end_msg_ix: i64,
    path: String,
}

#[derive(Default)]
struct Inner {
    next_job_id: JobId,
    jobs: HashMap<JobId, JobRecord>,
    artifacts: Vec<StoredArtifact>,
}

/// In-memory implementation of the job store interface.
///
/// Stands in for the external job-metadata database in tests and demo
/// deployments. Artifact lookup is range-aware: an artifact covers every
/// message index in [begin_msg_ix, end_msg_ix], matching the stream-file
/// metadata query of the real store.
pub struct MemoryJobStore {
    inner: RwLock<Inner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Registers an extracted artifact covering the given message-index range.
    ///
    /// In production this write is performed by the extraction workers; tests
    /// and demo executors use it to simulate job completion.
    pub async fn insert_artifact(
        &self,
        stream_id: &str,
        begin_msg_ix: i64,
        end_msg_ix: i64,
        path: &str,
    ) {
        let mut inner = self.inner.write().await;
        inner.artifacts.push(StoredArtifact {
            stream_id: stream_id.to_string(),
            begin_msg_ix,
            end_msg_ix,
            path: path.to_string(),
        });
    }

    /// Transitions a job to a new state. State ownership belongs to the
    /// execution system; in the real store transitions are forward-only.
    pub async fn set_job_state(&self, job_id: JobId, state: JobState) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(StoreError::JobNotFound(job_id))?;
        debug!(job_id, from = ?record.state, to = ?state, "Job state transition");
        record.state = state;
        Ok(())
    }

    pub async fn job(&self, job_id: JobId) -> Option<JobRecord> {
        self.inner.read().await.jobs.get(&job_id).cloned()
    }

    pub async fn jobs(&self) -> Vec<(JobId, JobRecord)> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<_> = inner.jobs.iter().map(|(id, r)| (*id, r.clone())).collect();
        jobs.sort_by_key(|(id, _)| *id);
        jobs
    }

    pub async fn job_count(&self) -> usize {
        self.inner.read().await.jobs.len()
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn submit_job(
        &self,
        job_type: ExtractJobType,
        config: JobConfig,
    ) -> Result<JobId, StoreError> {
        let mut inner = self.inner.write().await;
        let job_id = inner.next_job_id;
        inner.next_job_id += 1;
        inner.jobs.insert(
            job_id,
            JobRecord {
                job_type,
                config,
                state: JobState::Pending,
            },
        );
        Ok(job_id)
    }

    async fn job_state(&self, job_id: JobId) -> Result<JobState, StoreError> {
        let inner = self.inner.read().await;
        inner
            .jobs
            .get(&job_id)
            .map(|record| record.state)
            .ok_or(StoreError::JobNotFound(job_id))
    }

    async fn find_artifact(
        &self,
        stream_id: &str,
        msg_ix: i64,
    ) -> Result<Option<ArtifactMetadata>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .artifacts
            .iter()
            .find(|a| {
                a.stream_id == stream_id && a.begin_msg_ix <= msg_ix && msg_ix <= a.end_msg_ix
            })
            .map(|a| ArtifactMetadata {
                path: a.path.clone(),
                begin_msg_ix: a.begin_msg_ix,
            }))
    }
}
