use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::config::VrduConfig;
use crate::core::extractor::extract_document;
use crate::fields::validate_field_requests;
use crate::geometry::Document;
use crate::types::{DocumentResult, FieldRequest};
use crate::{Result, VrduError};

use super::store::JobStore;
use super::types::{FailureKind, Job, JobFailure, JobId, JobStatus, now_ms};

struct QueuedJob {
    id: JobId,
    document: Document,
    fields: Vec<FieldRequest>,
}

/// Accepts documents, queues them, and runs them one at a time on a
/// background worker.
///
/// # Example
///
/// ```rust
/// use vrdu::core::config::VrduConfig;
/// use vrdu::geometry::Document;
/// use vrdu::jobs::{JobOrchestrator, JobStatus};
/// use vrdu::WordBox;
///
/// # #[tokio::main]
/// # async fn main() -> vrdu::Result<()> {
/// let orchestrator = JobOrchestrator::start(VrduConfig::default())?;
/// let document = Document::from_pages(vec![vec![
///     WordBox::new("Total", 0.96, 0.0, 0.0, 40.0, 10.0),
///     WordBox::new("$45.00", 0.91, 80.0, 0.0, 48.0, 10.0),
/// ]]);
///
/// let job_id = orchestrator.submit(document, ["Total"])?;
/// let job = orchestrator.wait(&job_id).await.expect("job exists");
/// assert_eq!(job.status, JobStatus::Completed);
/// orchestrator.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct JobOrchestrator {
    store: Arc<JobStore>,
    config: Arc<VrduConfig>,
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("jobs", &self.store.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl JobOrchestrator {
    /// Spawn the worker on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `VrduError::Validation` for an invalid configuration and
    /// `VrduError::Other` when called outside a Tokio runtime.
    pub fn start(config: VrduConfig) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| VrduError::Other(format!("Job orchestrator requires a Tokio runtime: {}", e)))?;

        let store = Arc::new(JobStore::new());
        let config = Arc::new(config);
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = runtime.spawn(worker_loop(receiver, Arc::clone(&store), Arc::clone(&config)));

        Ok(Self {
            store,
            config,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn config(&self) -> &VrduConfig {
        &self.config
    }

    /// Queue `document` for extraction of `fields`.
    ///
    /// Returns as soon as the job is queued; processing happens in the
    /// background.
    ///
    /// # Errors
    ///
    /// - `VrduError::Validation` for an empty, blank or duplicated field list
    /// - `VrduError::JobProcessing` after [`shutdown`](Self::shutdown)
    pub fn submit<I, F>(&self, document: Document, fields: I) -> Result<JobId>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldRequest>,
    {
        let fields = validate_field_requests(fields.into_iter().map(Into::into).collect())?;
        let id = JobId::new();

        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(VrduError::JobProcessing("Job orchestrator is shut down".to_string()));
        };

        self.store
            .insert(Job::queued(id, document.name().map(str::to_string), fields.clone()));

        if sender.send(QueuedJob { id, document, fields }).is_err() {
            self.store.remove(&id);
            return Err(VrduError::JobProcessing("Job worker is no longer running".to_string()));
        }

        tracing::info!(job_id = %id, "Job queued");
        Ok(id)
    }

    /// Snapshot of a job; never blocks on processing.
    pub fn get_status(&self, id: &JobId) -> Option<Job> {
        self.store.get(id)
    }

    /// Wait until the job is completed or failed.
    pub async fn wait(&self, id: &JobId) -> Option<Job> {
        self.store.wait_terminal(id).await
    }

    pub fn job_count(&self) -> usize {
        self.store.len()
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop accepting jobs and wait for the worker to drain the queue.
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();

        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            tracing::warn!(error = %e, "Job worker ended abnormally");
        }
    }
}

async fn worker_loop(mut receiver: mpsc::UnboundedReceiver<QueuedJob>, store: Arc<JobStore>, config: Arc<VrduConfig>) {
    tracing::info!("Job worker started");

    while let Some(job) = receiver.recv().await {
        run_job(job, &store, &config).await;
    }

    tracing::info!("Job worker stopped");
}

#[tracing::instrument(skip_all, fields(job_id = %queued.id))]
async fn run_job(queued: QueuedJob, store: &JobStore, config: &Arc<VrduConfig>) {
    let QueuedJob { id, document, fields } = queued;

    store.update(&id, |job| {
        job.status = JobStatus::Processing;
        job.started_at_ms = Some(now_ms());
    });
    tracing::info!(pages = document.page_count(), "Job processing");

    let task_config = Arc::clone(config);
    let task = tokio::spawn(async move { extract_document(document, fields, &task_config).await });
    let abort = task.abort_handle();

    let joined = match config.jobs.max_job_duration_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), task).await {
            Ok(joined) => joined,
            Err(_) => {
                abort.abort();
                let message = VrduError::Timeout(secs * 1000).to_string();
                finish(store, &id, Err(JobFailure::new(FailureKind::Timeout, message)));
                return;
            }
        },
        None => task.await,
    };

    let outcome = match joined {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(JobFailure::from_error(&e)),
        Err(e) if e.is_panic() => Err(JobFailure::new(
            FailureKind::Panic,
            format!("Job panicked: {}", panic_message(e.into_panic())),
        )),
        Err(e) => Err(JobFailure::new(FailureKind::Processing, format!("Job task was cancelled: {}", e))),
    };

    finish(store, &id, outcome);
}

fn finish(store: &JobStore, id: &JobId, outcome: std::result::Result<DocumentResult, JobFailure>) {
    match &outcome {
        Ok(result) => tracing::info!(
            pages = result.metadata.pages_processed,
            skipped = result.metadata.skipped_pages.len(),
            "Job completed"
        ),
        Err(failure) => tracing::warn!(kind = ?failure.kind, message = %failure.message, "Job failed"),
    }

    store.update(id, |job| {
        job.finished_at_ms = Some(now_ms());
        match outcome {
            Ok(result) => {
                job.status = JobStatus::Completed;
                job.result = Some(result);
            }
            Err(failure) => {
                job.status = JobStatus::Failed;
                job.error = Some(failure);
            }
        }
    });
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
