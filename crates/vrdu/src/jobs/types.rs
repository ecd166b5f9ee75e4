use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DocumentResult, FieldRequest};
use crate::VrduError;

/// Opaque job identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = VrduError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| VrduError::validation_with_source(format!("Invalid job id '{}'", s), e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The document had pages but none could be read.
    AllPagesFailed,
    Processing,
    Panic,
    Timeout,
}

/// Human-readable failure summary attached to a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify an error that escaped document extraction.
    pub fn from_error(err: &VrduError) -> Self {
        let kind = match err {
            VrduError::GeometrySource { .. } => FailureKind::AllPagesFailed,
            VrduError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::Processing,
        };
        Self::new(kind, err.to_string())
    }
}

/// Snapshot of a job. Callers always receive clones, never references into
/// the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub requested_fields: Vec<FieldRequest>,
    pub result: Option<DocumentResult>,
    pub error: Option<JobFailure>,
    /// Unix milliseconds.
    pub submitted_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
}

impl Job {
    pub(crate) fn queued(job_id: JobId, document: Option<String>, requested_fields: Vec<FieldRequest>) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
            document,
            requested_fields,
            result: None,
            error: None,
            submitted_at_ms: now_ms(),
            started_at_ms: None,
            finished_at_ms: None,
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
