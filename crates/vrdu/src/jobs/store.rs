use dashmap::DashMap;
use tokio::sync::Notify;

use super::types::{Job, JobId};

/// Concurrent job table.
///
/// One writer (the worker) and any number of readers. Reads return clones, so
/// a caller's snapshot never changes under it.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: DashMap<JobId, Job>,
    terminal: Notify,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.jobs.insert(job.job_id, job);
    }

    pub fn remove(&self, id: &JobId) -> Option<Job> {
        self.jobs.remove(id).map(|(_, job)| job)
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Apply `update` to a job in place. Returns false for unknown ids.
    ///
    /// Waiters are woken when the update leaves the job in a terminal state.
    pub fn update(&self, id: &JobId, update: impl FnOnce(&mut Job)) -> bool {
        let terminal = match self.jobs.get_mut(id) {
            Some(mut entry) => {
                update(entry.value_mut());
                entry.status.is_terminal()
            }
            None => return false,
        };

        if terminal {
            self.terminal.notify_waiters();
        }
        true
    }

    /// Resolve once the job is terminal. `None` for unknown ids.
    pub async fn wait_terminal(&self, id: &JobId) -> Option<Job> {
        loop {
            let mut notified = std::pin::pin!(self.terminal.notified());
            notified.as_mut().enable();

            let job = self.get(id)?;
            if job.status.is_terminal() {
                return Some(job);
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::JobStatus;
    use std::sync::Arc;
    use std::time::Duration;

    fn queued() -> Job {
        Job::queued(JobId::new(), None, vec!["Total".into()])
    }

    #[test]
    fn test_snapshots_are_detached() {
        let store = JobStore::new();
        let job = queued();
        let id = job.job_id;
        store.insert(job);

        let snapshot = store.get(&id).unwrap();
        store.update(&id, |job| job.status = JobStatus::Processing);

        assert_eq!(snapshot.status, JobStatus::Queued);
        assert_eq!(store.get(&id).unwrap().status, JobStatus::Processing);
    }

    #[test]
    fn test_update_unknown_job() {
        let store = JobStore::new();
        assert!(!store.update(&JobId::new(), |job| job.status = JobStatus::Failed));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_wait_terminal_wakes_on_completion() {
        let store = Arc::new(JobStore::new());
        let job = queued();
        let id = job.job_id;
        store.insert(job);

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.wait_terminal(&id).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.update(&id, |job| job.status = JobStatus::Processing);
        store.update(&id, |job| job.status = JobStatus::Completed);

        let finished = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter should wake")
            .unwrap()
            .unwrap();
        assert_eq!(finished.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_wait_terminal_unknown_job() {
        let store = JobStore::new();
        assert!(store.wait_terminal(&JobId::new()).await.is_none());
    }
}
