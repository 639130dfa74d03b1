//! One-shot job scheduler with tag-based cancellation.
//!
//! The room service schedules delayed callbacks (auto-start, auto-close)
//! and needs to cancel them in groups: a room owns several pending jobs
//! and closing the room must cancel all of them atomically from outside.
//! Jobs therefore carry string tags, and cancellation works by id or by
//! tag.
//!
//! Each scheduled job is its own Tokio task racing a cancel signal
//! against a sleep. A job that fires removes itself from the registry
//! before running; a job that is cancelled never runs its callback.
//! Cancellation is safe to call from any task, including one that races
//! the fire instant: whichever side removes the registry entry first
//! wins.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;

/// A handle to a scheduled job, usable for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

struct JobEntry {
    cancel_tx: mpsc::Sender<()>,
    tags: Vec<String>,
}

struct SchedulerInner {
    jobs: DashMap<u64, JobEntry>,
    next_id: AtomicU64,
}

/// A shared scheduler of delayed one-shot jobs.
///
/// Cheap to clone; all clones share the same job registry.
#[derive(Clone)]
pub struct JobScheduler {
    inner: Arc<SchedulerInner>,
}

impl JobScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                jobs: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Schedules `job` to run once after `delay`.
    ///
    /// The returned [`JobId`] and every string in `tags` can be used to
    /// cancel the job before it fires. The callback runs on its own
    /// task; errors inside it are the callback's business.
    pub fn schedule_once<F, Fut>(&self, delay: Duration, tags: Vec<String>, job: F) -> JobId
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, mut cancel_rx) = mpsc::channel(1);

        tracing::trace!(job = id, ?tags, ?delay, "job scheduled");
        self.inner.jobs.insert(id, JobEntry { cancel_tx, tags });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_rx.recv() => {
                    inner.jobs.remove(&id);
                }
                _ = tokio::time::sleep(delay) => {
                    // Claim the entry before running: a cancel that lost
                    // this race must find nothing left to cancel.
                    if inner.jobs.remove(&id).is_some() {
                        job().await;
                    }
                }
            }
        });

        JobId(id)
    }

    /// Cancels a single job. Returns `true` if the job was still pending.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.inner.jobs.remove(&id.0) {
            Some((_, entry)) => {
                let _ = entry.cancel_tx.try_send(());
                true
            }
            None => false,
        }
    }

    /// Cancels every pending job carrying `tag`. Returns how many jobs
    /// were cancelled.
    pub fn cancel_tag(&self, tag: &str) -> usize {
        let ids: Vec<u64> = self
            .inner
            .jobs
            .iter()
            .filter(|entry| entry.tags.iter().any(|t| t == tag))
            .map(|entry| *entry.key())
            .collect();
        let mut cancelled = 0;
        for id in ids {
            if self.cancel(JobId(id)) {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::trace!(tag, cancelled, "jobs cancelled by tag");
        }
        cancelled
    }

    /// Number of jobs still pending.
    pub fn pending(&self) -> usize {
        self.inner.jobs.len()
    }

    /// Number of pending jobs carrying `tag`.
    pub fn pending_tagged(&self, tag: &str) -> usize {
        self.inner
            .jobs
            .iter()
            .filter(|entry| entry.tags.iter().any(|t| t == tag))
            .count()
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}
