//! Bounded-concurrency FIFO task queue.
//!
//! [`TaskQueue`] runs a fixed pool of workers that pull submitted futures from
//! a shared FIFO channel, so at most `concurrency` tasks execute at once no
//! matter how fast tasks are submitted.
//!
//! # Overview
//!
//! - [`TaskQueue::submit`] never waits; the task is queued behind earlier ones.
//! - A task's error or panic is captured in its [`TaskReport`] and never
//!   affects other tasks.
//! - [`TaskQueue::drain`] resolves once every submitted task is terminal and
//!   returns the reports in submission order.
//!
//! # Example
//!
//! ```
//! use course_downloader::queue::{TaskOutcome, TaskQueue};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut queue: TaskQueue<u32, String> = TaskQueue::new(2)?;
//! queue.submit("one", async { Ok(1) })?;
//! queue.submit("two", async { Err("boom".to_string()) })?;
//!
//! let reports = queue.drain().await;
//! assert!(matches!(reports[0].outcome, TaskOutcome::Succeeded(1)));
//! assert!(matches!(reports[1].outcome, TaskOutcome::Failed(_)));
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::QueueError;

use std::any::Any;
use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Submission-order identifier of a task.
pub type TaskId = usize;

/// Terminal state of one task.
#[derive(Debug)]
pub enum TaskOutcome<T, E> {
    /// The task returned `Ok`.
    Succeeded(T),
    /// The task returned `Err`.
    Failed(E),
    /// The task panicked; holds the panic message.
    Panicked(String),
}

impl<T, E> TaskOutcome<T, E> {
    /// Returns true for [`TaskOutcome::Succeeded`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Report for one task, produced by [`TaskQueue::drain`].
#[derive(Debug)]
pub struct TaskReport<T, E> {
    /// Submission-order id.
    pub id: TaskId,
    /// Label given at submission, used in logs.
    pub label: String,
    /// How the task ended.
    pub outcome: TaskOutcome<T, E>,
    /// Run time, excluding time spent waiting in the queue.
    pub elapsed: Duration,
}

struct Job<T, E> {
    id: TaskId,
    label: String,
    future: BoxFuture<'static, Result<T, E>>,
}

/// A fixed pool of workers over a FIFO channel.
pub struct TaskQueue<T, E> {
    concurrency: usize,
    next_id: TaskId,
    jobs: mpsc::UnboundedSender<Job<T, E>>,
    reports: mpsc::UnboundedReceiver<TaskReport<T, E>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T, E> std::fmt::Debug for TaskQueue<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("concurrency", &self.concurrency)
            .field("submitted", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl<T, E> TaskQueue<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    /// Starts `concurrency` workers.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConcurrency`] if `concurrency` is outside `1..=100`.
    pub fn new(concurrency: usize) -> Result<Self, QueueError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(QueueError::InvalidConcurrency { value: concurrency });
        }

        let (jobs, job_rx) = mpsc::unbounded_channel::<Job<T, E>>();
        let (report_tx, reports) = mpsc::unbounded_channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..concurrency)
            .map(|worker| {
                let job_rx = Arc::clone(&job_rx);
                let report_tx = report_tx.clone();
                tokio::spawn(run_worker(worker, job_rx, report_tx))
            })
            .collect();

        debug!(concurrency, "task queue started");
        Ok(Self {
            concurrency,
            next_id: 0,
            jobs,
            reports,
            workers,
        })
    }

    /// Returns the worker count.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Queues a task behind all earlier submissions. Never waits.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if no worker remains to run it.
    pub fn submit<F>(&mut self, label: impl Into<String>, future: F) -> Result<TaskId, QueueError>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let id = self.next_id;
        let job = Job {
            id,
            label: label.into(),
            future: Box::pin(future),
        };
        self.jobs.send(job).map_err(|_| QueueError::Closed)?;
        self.next_id += 1;
        Ok(id)
    }

    /// Waits for every submitted task and returns their reports by id.
    pub async fn drain(self) -> Vec<TaskReport<T, E>> {
        let Self {
            jobs,
            mut reports,
            workers,
            next_id,
            ..
        } = self;

        // Closing the channel lets idle workers exit once the backlog is empty.
        drop(jobs);
        for handle in workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "queue worker terminated abnormally");
            }
        }

        let mut collected = Vec::with_capacity(next_id);
        while let Some(report) = reports.recv().await {
            collected.push(report);
        }
        collected.sort_by_key(|report| report.id);
        info!(
            total = collected.len(),
            failed = collected.iter().filter(|r| !r.outcome.is_success()).count(),
            "task queue drained"
        );
        collected
    }
}

async fn run_worker<T, E>(
    worker: usize,
    jobs: Arc<Mutex<mpsc::UnboundedReceiver<Job<T, E>>>>,
    reports: mpsc::UnboundedSender<TaskReport<T, E>>,
) where
    E: Display,
{
    loop {
        // The lock is released before the job runs, so other workers keep pulling.
        let next = jobs.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        debug!(worker, task = job.id, label = %job.label, "task started");
        let started = Instant::now();
        let outcome = match AssertUnwindSafe(job.future).catch_unwind().await {
            Ok(Ok(value)) => TaskOutcome::Succeeded(value),
            Ok(Err(error)) => {
                warn!(task = job.id, label = %job.label, error = %error, "task failed");
                TaskOutcome::Failed(error)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(task = job.id, label = %job.label, panic = %message, "task panicked");
                TaskOutcome::Panicked(message)
            }
        };

        let report = TaskReport {
            id: job.id,
            label: job.label,
            outcome,
            elapsed: started.elapsed(),
        };
        if reports.send(report).is_err() {
            break;
        }
    }
    debug!(worker, "worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_invalid_concurrency_zero() {
        let err = TaskQueue::<(), String>::new(0).unwrap_err();
        assert_eq!(err, QueueError::InvalidConcurrency { value: 0 });
    }

    #[tokio::test]
    async fn test_invalid_concurrency_too_high() {
        assert!(TaskQueue::<(), String>::new(101).is_err());
        assert_eq!(TaskQueue::<(), String>::new(100).unwrap().concurrency(), 100);
    }

    #[tokio::test]
    async fn test_drain_empty_queue() {
        let queue = TaskQueue::<(), String>::new(4).unwrap();
        assert!(queue.drain().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_holds_under_burst() {
        const CONCURRENCY: usize = 3;
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut queue = TaskQueue::<(), String>::new(CONCURRENCY).unwrap();
        for i in 0..25 {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            queue
                .submit(format!("task-{i}"), async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        let reports = queue.drain().await;
        assert_eq!(reports.len(), 25);
        assert_eq!(peak.load(Ordering::SeqCst), CONCURRENCY);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ceiling_holds_with_blocked_tasks() {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let started = Arc::new(AtomicUsize::new(0));

        let mut queue = TaskQueue::<(), String>::new(2).unwrap();
        for _ in 0..6 {
            let gate = Arc::clone(&gate);
            let started = Arc::clone(&started);
            queue
                .submit("blocked", async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    gate.acquire().await.unwrap().forget();
                    Ok(())
                })
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);

        gate.add_permits(6);
        let reports = queue.drain().await;
        assert_eq!(reports.len(), 6);
        assert_eq!(started.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_single_worker_runs_in_submission_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut queue = TaskQueue::<usize, String>::new(1).unwrap();
        for i in 0..10 {
            let order = Arc::clone(&order);
            queue
                .submit(format!("task-{i}"), async move {
                    order.lock().unwrap().push(i);
                    tokio::task::yield_now().await;
                    Ok(i)
                })
                .unwrap();
        }

        let reports = queue.drain().await;
        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
        let ids: Vec<_> = reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failures_and_panics_do_not_stop_siblings() {
        let mut queue = TaskQueue::<u32, String>::new(2).unwrap();
        queue.submit("ok-1", async { Ok(1) }).unwrap();
        queue
            .submit("fails", async { Err("resolve failed".to_string()) })
            .unwrap();
        queue
            .submit("panics", async { panic!("remux exploded") })
            .unwrap();
        queue.submit("ok-2", async { Ok(2) }).unwrap();

        let reports = queue.drain().await;
        assert_eq!(reports.len(), 4);
        assert!(matches!(reports[0].outcome, TaskOutcome::Succeeded(1)));
        assert!(matches!(&reports[1].outcome, TaskOutcome::Failed(e) if e == "resolve failed"));
        assert!(matches!(&reports[2].outcome, TaskOutcome::Panicked(m) if m == "remux exploded"));
        assert!(matches!(reports[3].outcome, TaskOutcome::Succeeded(2)));
        assert_eq!(reports[2].label, "panics");
    }

    #[test]
    fn test_panic_message_formats() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "task panicked");
    }
}
