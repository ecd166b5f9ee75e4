//! Asynchronous job orchestration.
//!
//! Jobs move `queued → processing → completed | failed` and never leave a
//! terminal state. A single background worker consumes a FIFO queue, so jobs
//! run one at a time in submission order. Status reads are lock-free snapshots
//! from a concurrent map and never wait on processing.
//!
//! Failures are contained at the job boundary: an error, a panic or a timeout
//! inside one job marks that job failed with a [`JobFailure`] summary and the
//! worker moves on to the next one.

pub mod orchestrator;
pub mod store;
pub mod types;

pub use orchestrator::JobOrchestrator;
pub use store::JobStore;
pub use types::{FailureKind, Job, JobFailure, JobId, JobStatus};
