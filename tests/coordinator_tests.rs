/// Coordinator tests: dedup lookup, submission, bounded polling, and the
/// failure paths of the extraction query flow, driven against the in-memory
/// job store.
use std::sync::Arc;
use std::time::Duration;

use streamgate::jobs::coordinator::{ExtractJobCoordinator, QueryError};
use streamgate::jobs::{ExtractJobType, ExtractionRequest, JobConfig, JobState};
use streamgate::storage::memory::MemoryJobStore;
use streamgate::storage::traits::JobStore;

fn coordinator(store: Arc<MemoryJobStore>) -> ExtractJobCoordinator {
    ExtractJobCoordinator::new(store, Duration::from_millis(10), Duration::from_millis(500))
}

fn ir_request(stream_id: &str, log_event_idx: i64) -> ExtractionRequest {
    ExtractionRequest {
        job_type: ExtractJobType::ExtractIr,
        stream_id: stream_id.to_string(),
        log_event_idx: Some(log_event_idx),
        timestamp: None,
    }
}

fn json_request(archive_id: &str, timestamp: i64) -> ExtractionRequest {
    ExtractionRequest {
        job_type: ExtractJobType::ExtractJson,
        stream_id: archive_id.to_string(),
        log_event_idx: None,
        timestamp: Some(timestamp),
    }
}

/// How the stand-in extraction executor finishes the first submitted job.
enum ExecutorOutcome {
    /// Succeed, optionally writing (stream_id, begin, end, path) first.
    Succeed(Option<(String, i64, i64, String)>),
    Fail,
}

/// Spawns a stand-in for the extraction executor: waits for a job to appear,
/// then applies the outcome to it.
fn spawn_executor(store: Arc<MemoryJobStore>, outcome: ExecutorOutcome) {
    tokio::spawn(async move {
        loop {
            let jobs = store.jobs().await;
            if let Some((job_id, _)) = jobs.into_iter().next() {
                match outcome {
                    ExecutorOutcome::Succeed(artifact) => {
                        if let Some((stream_id, begin, end, path)) = artifact {
                            store.insert_artifact(&stream_id, begin, end, &path).await;
                        }
                        store
                            .set_job_state(job_id, JobState::Succeeded)
                            .await
                            .unwrap();
                    }
                    ExecutorOutcome::Fail => {
                        store.set_job_state(job_id, JobState::Failed).await.unwrap();
                    }
                }
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });
}

#[tokio::test]
async fn existing_artifact_resolves_without_a_new_job() {
    // Scenario: the coordinate is already covered by an extracted artifact
    let store = Arc::new(MemoryJobStore::new());
    store.insert_artifact("f1", 10, 200, "f1-chunk-0.clp.zst").await;
    let coordinator = coordinator(store.clone());

    let metadata = coordinator.resolve(&ir_request("f1", 42)).await.unwrap();

    assert_eq!(metadata.path, "f1-chunk-0.clp.zst");
    assert_eq!(metadata.begin_msg_ix, 10);
    // Dedup: no job was submitted
    assert_eq!(store.job_count().await, 0);
    // 1-based position within the artifact
    assert_eq!(42 - metadata.begin_msg_ix + 1, 33);
}

#[tokio::test]
async fn repeated_requests_share_the_first_artifact() {
    let store = Arc::new(MemoryJobStore::new());
    store.insert_artifact("f1", 0, 999, "f1-chunk-0.clp.zst").await;
    let coordinator = Arc::new(coordinator(store.clone()));

    let req_a = ir_request("f1", 5);
    let req_b = ir_request("f1", 900);
    let (a, b) = tokio::join!(coordinator.resolve(&req_a), coordinator.resolve(&req_b));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn json_extraction_submits_and_waits_for_completion() {
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store.clone());

    spawn_executor(
        store.clone(),
        ExecutorOutcome::Succeed(Some(("a1".to_string(), 0, 99_999, "a1-chunk-0.json".to_string()))),
    );

    let metadata = coordinator
        .resolve(&json_request("a1", 1_000_000))
        .await
        .unwrap();

    assert_eq!(metadata.path, "a1-chunk-0.json");
    assert_eq!(store.job_count().await, 1);

    // The submitted config targets a fixed record-count chunk
    let (_, record) = store.jobs().await.into_iter().next().unwrap();
    assert_eq!(
        record.config,
        JobConfig::ExtractJson {
            archive_id: "a1".to_string(),
            target_chunk_size: 100_000,
        }
    );
}

#[tokio::test]
async fn ir_extraction_submits_anchored_job_config() {
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store.clone());

    spawn_executor(
        store.clone(),
        ExecutorOutcome::Succeed(Some((
            "f1".to_string(),
            40,
            500,
            "f1-chunk-1.clp.zst".to_string(),
        ))),
    );

    let metadata = coordinator.resolve(&ir_request("f1", 42)).await.unwrap();
    assert_eq!(metadata.begin_msg_ix, 40);

    let (_, record) = store.jobs().await.into_iter().next().unwrap();
    assert_eq!(
        record.config,
        JobConfig::ExtractIr {
            orig_file_id: "f1".to_string(),
            file_split_id: None,
            msg_ix: 42,
            target_uncompressed_size: 128 * 1024 * 1024,
        }
    );
}

#[tokio::test]
async fn negative_index_is_rejected_before_submission() {
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store.clone());

    let err = coordinator.resolve(&ir_request("f1", -1)).await.unwrap_err();

    assert!(matches!(err, QueryError::InvalidCoordinate { .. }));
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn poll_deadline_failure_names_the_coordinate() {
    // No executor: the job stays Pending until the wait budget runs out
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = ExtractJobCoordinator::new(
        store.clone(),
        Duration::from_millis(5),
        Duration::from_millis(50),
    );

    let err = coordinator.resolve(&ir_request("f1", 42)).await.unwrap_err();

    match &err {
        QueryError::ExtractionFailed {
            stream_id,
            log_event_idx,
        } => {
            assert_eq!(stream_id, "f1");
            assert_eq!(*log_event_idx, 42);
        }
        other => panic!("expected ExtractionFailed, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("f1"));
    assert!(msg.contains("42"));
}

#[tokio::test]
async fn failed_job_reports_extraction_failure() {
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store.clone());

    spawn_executor(store.clone(), ExecutorOutcome::Fail);

    let err = coordinator
        .resolve(&json_request("a1", 1_000_000))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::ExtractionFailed { .. }));
}

#[tokio::test]
async fn success_without_artifact_is_a_protocol_violation() {
    // A job that reports success but produces no discoverable artifact fails
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store.clone());

    spawn_executor(store.clone(), ExecutorOutcome::Succeed(None));

    let err = coordinator.resolve(&ir_request("f1", 42)).await.unwrap_err();
    assert!(matches!(err, QueryError::ExtractionFailed { .. }));
}

#[tokio::test]
async fn index_zero_resolves() {
    let store = Arc::new(MemoryJobStore::new());
    store.insert_artifact("f1", 0, 100, "f1-chunk-0.clp.zst").await;
    let coordinator = coordinator(store.clone());

    let metadata = coordinator.resolve(&ir_request("f1", 0)).await.unwrap();
    assert_eq!(0 - metadata.begin_msg_ix + 1, 1);
}

#[tokio::test]
async fn submission_acknowledgment_precedes_completion() {
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store.clone());

    // Two-phase: the submission handle is available before the job finishes
    let pending = coordinator.submit(&ir_request("f1", 42)).await.unwrap();
    let job_id = pending.job_id();
    assert_eq!(store.job_state(job_id).await.unwrap(), JobState::Pending);

    store.insert_artifact("f1", 40, 500, "f1-chunk-1.clp.zst").await;
    store
        .set_job_state(job_id, JobState::Succeeded)
        .await
        .unwrap();

    let metadata = pending.await_completion().await.unwrap();
    assert_eq!(metadata.begin_msg_ix, 40);
}
