pub mod coordinator;

pub use coordinator::{ExtractJobCoordinator, PendingExtraction, QueryError};

use serde::{Deserialize, Serialize};

/// Uncompressed size an IR extraction job targets for each output chunk.
pub const EXTRACT_IR_TARGET_UNCOMPRESSED_SIZE: u64 = 128 * 1024 * 1024;

/// Record count a JSON extraction job targets for each output chunk.
pub const EXTRACT_JSON_TARGET_CHUNK_SIZE: u64 = 100 * 1000;

/// Identifier assigned by the job record store at submission.
pub type JobId = u64;

/// Kind of stream extraction a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractJobType {
    ExtractIr,
    ExtractJson,
}

impl ExtractJobType {
    /// Parses the wire name of a job type. Returns None for unknown names so
    /// callers can reject them before any store I/O happens.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "extract_ir" => Some(Self::ExtractIr),
            "extract_json" => Some(Self::ExtractJson),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractIr => "extract_ir",
            Self::ExtractJson => "extract_json",
        }
    }
}

/// A single resolution request: locate the extracted view of one log event.
///
/// Exactly one of `log_event_idx` / `timestamp` is meaningful per job type;
/// the coordinator validates the shape before building a job config.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub job_type: ExtractJobType,
    pub stream_id: String,
    pub log_event_idx: Option<i64>,
    pub timestamp: Option<i64>,
}

/// Type-specific job payload, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobConfig {
    ExtractIr {
        orig_file_id: String,
        /// Resolved by the execution system; always None at submission time.
        file_split_id: Option<String>,
        msg_ix: i64,
        target_uncompressed_size: u64,
    },
    ExtractJson {
        archive_id: String,
        target_chunk_size: u64,
    },
}

/// Job lifecycle state. Transitions are monotonic forward and owned by the
/// external execution system; this crate only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Location of an extracted stream chunk. `begin_msg_ix` is the first log
/// event index the chunk contains and is only meaningful for IR artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub path: String,
    pub begin_msg_ix: i64,
}
