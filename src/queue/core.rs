//! # The admission gate.
//!
//! [`TaskQueue`] enforces two limits over submitted tasks:
//!
//! - `workers` — how many tasks may *execute* concurrently;
//! - `size` — how many tasks may be *in the system* (executing, accepted but
//!   not yet executing, or blocked at the gate).
//!
//! ## Admission decision
//! ```text
//! admit(task)
//!   │
//!   ├─ stopped?                      ──► Err(AdmitError::Stopped)
//!   │
//!   ├─ running < workers            ──► run now, return live Ticket
//!   │
//!   ├─ running + waiters >= size    ──► register Blocked waiter,
//!   │                                   suspend caller, re-evaluate
//!   │                                   when released (backpressure)
//!   │
//!   └─ else (size headroom)         ──► return Ticket immediately,
//!                                       register Pending job; a later
//!                                       completion starts it (FIFO)
//! ```
//!
//! ## Completion
//! Every task completion (success, failure, or panic) decrements the running
//! count and releases exactly one slot-waiter, FIFO. If no waiter exists and
//! the count reached zero, all drain-waiters (suspended [`TaskQueue::wait`]
//! callers) are released together.
//!
//! All state lives behind a single mutex. Critical sections never await,
//! never run user code, and never complete a waiter while held: blocked
//! callers are resumed through a oneshot (the scheduler hands off), pending
//! jobs only spawn. Completion can therefore never re-enter itself
//! synchronously, no matter how tasks finish.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::config::QueueConfig;
use crate::error::{AdmitError, ConfigError};
use crate::logging::{LogRecord, LogSink, ERROR_TAG, LOG_TAG};

use super::ticket::Ticket;
use super::waiter::{Job, SlotWaiter};

/// Mutable queue state. Guarded by [`QueueInner::state`]; every transition
/// happens under that one lock.
#[derive(Default)]
struct State {
    /// Rejects new top-level admissions while set. Tasks already accepted
    /// keep draining.
    stopped: bool,

    /// Number of currently executing tasks. Never exceeds `workers`.
    running: usize,

    /// Demand for freed slots, FIFO. Blocked callers and pending tasks share
    /// this one queue; a completion releases the front entry, whichever
    /// flavor it is.
    slot_waiters: VecDeque<SlotWaiter>,

    /// Suspended `wait()` callers, all released together when `running`
    /// reaches zero.
    drain_waiters: Vec<oneshot::Sender<()>>,
}

/// What the completion notifier decided to do after a task finished.
/// Carried out of the critical section so no waiter runs under the lock.
enum Released {
    None,
    /// Resume one blocked `admit` caller.
    Caller(oneshot::Sender<()>),
    /// Start one pending task; the count was already re-incremented to it.
    Queued(Job, usize),
    /// The queue drained; release every `wait()` caller.
    Drained(Vec<oneshot::Sender<()>>),
}

/// How an admission attempt behaves when the queue is at capacity.
#[derive(Clone, Copy, PartialEq, Eq)]
enum AdmitMode {
    /// Register a `Blocked` waiter so the caller can suspend on it.
    Wait,
    /// Refuse with `Full`, leaving no trace in the waiter queue. This mode
    /// also refuses a stopped queue, so the whole non-blocking decision is
    /// one critical section.
    Refuse,
}

/// Outcome of one pass over the admission decision.
enum Admitted<F, T> {
    /// Task ran or was queued; the ticket goes to the caller.
    Ticket(Ticket<T>),
    /// Queue at capacity. The task comes back to the caller together with
    /// the channel that signals a freed slot. `Wait` mode only.
    MustWait(F, oneshot::Receiver<()>),
    /// Admission refused outright. `Refuse` mode only.
    Rejected(AdmitError),
}

/// Shared interior of a [`TaskQueue`]. Configuration is immutable after
/// construction; `state` is the only mutable part.
pub(super) struct QueueInner {
    name: String,
    size: usize,
    workers: usize,
    logger: Option<Arc<dyn LogSink>>,
    state: Mutex<State>,
}

impl QueueInner {
    /// Runs the admission decision once, atomically.
    fn try_start<F, Fut>(self: &Arc<Self>, task: F, mode: AdmitMode) -> Admitted<F, Fut::Output>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let mut state = self.state.lock();

        // `Wait` callers have already passed the entry-time stopped check
        // and must not re-fail on loop re-entry.
        if mode == AdmitMode::Refuse && state.stopped {
            return Admitted::Rejected(AdmitError::Stopped);
        }

        if state.running < self.workers {
            state.running += 1;
            let count = state.running;
            drop(state);

            self.log_started(count);
            let (tx, rx) = oneshot::channel::<Fut::Output>();
            self.spawn_task(task, tx);
            Admitted::Ticket(Ticket::new(rx))
        } else if state.running + state.slot_waiters.len() >= self.size {
            match mode {
                AdmitMode::Wait => {
                    let (tx, rx) = oneshot::channel();
                    state.slot_waiters.push_back(SlotWaiter::Blocked(tx));
                    Admitted::MustWait(task, rx)
                }
                AdmitMode::Refuse => Admitted::Rejected(AdmitError::Full),
            }
        } else {
            // Worker limit reached but size headroom remains: accept without
            // blocking. The ticket is handed out now; the launch is deferred
            // until a completion pops this job off the waiter queue.
            let (tx, rx) = oneshot::channel::<Fut::Output>();
            let job: Job = Box::new(move |inner| inner.spawn_task(task, tx));
            state.slot_waiters.push_back(SlotWaiter::Pending(job));
            Admitted::Ticket(Ticket::new(rx))
        }
    }

    /// Spawns the task onto the runtime, wired so that the completion
    /// notifier fires exactly once — before the ticket settles, and also
    /// when the task panics (the guard drops during unwind, in which case
    /// the ticket sender is dropped and the ticket reports `TaskAborted`).
    fn spawn_task<F, Fut>(self: &Arc<Self>, task: F, tx: oneshot::Sender<Fut::Output>)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let guard = FinishGuard { inner };
            let value = task().await;
            drop(guard);
            let _ = tx.send(value);
        });
    }

    /// Completion notifier: invoked exactly once per admitted task.
    pub(super) fn task_finished(self: &Arc<Self>) {
        let mut fault = false;

        let (count, mut released) = {
            let mut state = self.state.lock();

            if state.running == 0 {
                // More completions than admissions. Clamp instead of
                // corrupting subsequent admission decisions.
                fault = true;
            } else {
                state.running -= 1;
            }

            (state.running, Self::release_one(&mut state, self.workers))
        };

        // The finished record is emitted on faulty completions too (with the
        // clamped count), followed by the error record.
        self.log_finished(count);
        if fault {
            self.log_counter_fault();
        }

        loop {
            match released {
                Released::None => break,
                Released::Caller(tx) => {
                    if tx.send(()).is_ok() {
                        break;
                    }
                    // The blocked admission was dropped by its caller before
                    // it could be resumed; its demand is gone. Pass the
                    // release on to the next waiter, or to the drain branch,
                    // instead of losing it.
                    released = Self::release_one(&mut self.state.lock(), self.workers);
                }
                Released::Queued(job, count) => {
                    self.log_started(count);
                    job(self);
                    break;
                }
                Released::Drained(waiters) => {
                    for tx in waiters {
                        let _ = tx.send(());
                    }
                    break;
                }
            }
        }
    }

    /// Picks what one freed slot should release, under the state lock.
    ///
    /// The capacity guard matters on the retry path: between a failed
    /// release and the re-lock, a fresh admission may have claimed the slot,
    /// in which case nothing more is owed and later completions serve the
    /// remaining waiters.
    fn release_one(state: &mut State, workers: usize) -> Released {
        if state.running >= workers {
            return Released::None;
        }
        match state.slot_waiters.pop_front() {
            Some(SlotWaiter::Blocked(tx)) => Released::Caller(tx),
            Some(SlotWaiter::Pending(job)) => {
                state.running += 1;
                Released::Queued(job, state.running)
            }
            None if state.running == 0 => {
                Released::Drained(std::mem::take(&mut state.drain_waiters))
            }
            None => Released::None,
        }
    }

    fn log_started(&self, count: usize) {
        if let Some(logger) = &self.logger {
            logger.log(
                &[LOG_TAG],
                &LogRecord {
                    message: format!("Task started for '{}'. Tasks: {}", self.name, count),
                    name: &self.name,
                    task_count: Some(count),
                },
            );
        }
    }

    fn log_finished(&self, count: usize) {
        if let Some(logger) = &self.logger {
            logger.log(
                &[LOG_TAG],
                &LogRecord {
                    message: format!("Task finished for '{}'. Tasks: {}", self.name, count),
                    name: &self.name,
                    task_count: Some(count),
                },
            );
        }
    }

    fn log_counter_fault(&self) {
        if let Some(logger) = &self.logger {
            logger.log(
                &[ERROR_TAG, LOG_TAG],
                &LogRecord {
                    message: format!("Task counter is negative for '{}'", self.name),
                    name: &self.name,
                    task_count: None,
                },
            );
        }
    }
}

/// Fires the completion notifier exactly once when the spawned task ends,
/// on every path out of it.
struct FinishGuard {
    inner: Arc<QueueInner>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.inner.task_finished();
    }
}

/// Bounded-concurrency admission gate.
///
/// Cheap to clone; all clones share the same state, like a channel handle.
///
/// ## Example
/// ```rust
/// use taskgate::{QueueConfig, TaskQueue};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let queue = TaskQueue::new(QueueConfig {
///         name: "demo".into(),
///         size: Some(3),
///         workers: Some(1),
///     })?;
///
///     // Runs immediately: one worker is free.
///     let first = queue.admit(|| async { "one" }).await?;
///     // Accepted without blocking (size headroom), runs when `first` ends.
///     let second = queue.admit(|| async { "two" }).await?;
///
///     assert_eq!(first.await?, "one");
///     assert_eq!(second.await?, "two");
///
///     queue.stop().await;
///     assert!(queue.admit(|| async {}).await.is_err());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
}

impl TaskQueue {
    /// Creates a queue from the given configuration, without a logger.
    ///
    /// There is no need to call [`start`](TaskQueue::start) on a new queue.
    pub fn new(config: QueueConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Creates a queue that reports observations to `logger`.
    ///
    /// If the sink reports the [`LOG_TAG`] tag disabled, it is dropped here
    /// and the queue behaves exactly as one built with
    /// [`new`](TaskQueue::new).
    pub fn with_logger(config: QueueConfig, logger: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        Self::build(config, Some(logger))
    }

    fn build(config: QueueConfig, logger: Option<Arc<dyn LogSink>>) -> Result<Self, ConfigError> {
        let (size, workers) = config.limits()?;
        let logger = logger.filter(|l| l.is_level_enabled(LOG_TAG));

        Ok(Self {
            inner: Arc::new(QueueInner {
                name: config.name,
                size,
                workers,
                logger,
                state: Mutex::new(State::default()),
            }),
        })
    }

    /// Submits a task for admission.
    ///
    /// - A free worker: the task starts immediately.
    /// - Worker limit reached but size headroom left: the call returns
    ///   immediately with a [`Ticket`]; the task starts, FIFO, once an
    ///   earlier task completes.
    /// - Queue full: the call suspends until capacity frees, then
    ///   re-evaluates. This is the only point of backpressure.
    ///
    /// Fails with [`AdmitError::Stopped`] if the queue is stopped at call
    /// time; that check is not repeated after a suspension.
    ///
    /// Whatever the task produces, including a panic, never fails `admit`
    /// itself; outcomes travel only through the ticket.
    pub async fn admit<F, Fut>(&self, task: F) -> Result<Ticket<Fut::Output>, AdmitError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        if self.inner.state.lock().stopped {
            return Err(AdmitError::Stopped);
        }

        let mut task = task;
        loop {
            match self.inner.try_start(task, AdmitMode::Wait) {
                Admitted::Ticket(ticket) => return Ok(ticket),
                Admitted::Rejected(err) => return Err(err),
                Admitted::MustWait(returned, released) => {
                    task = returned;
                    // Sender dropped without a signal cannot happen while the
                    // queue is alive; treat it as a release either way.
                    let _ = released.await;
                }
            }
        }
    }

    /// Submits a task only if the queue has capacity for it right now.
    ///
    /// Never blocks: where [`admit`](TaskQueue::admit) would suspend, this
    /// returns [`AdmitError::Full`]. The task may still be queued rather
    /// than started when only the worker limit is saturated. The whole
    /// decision runs in one critical section, and a refused attempt leaves
    /// no trace in the waiter queue.
    pub fn try_admit<F, Fut>(&self, task: F) -> Result<Ticket<Fut::Output>, AdmitError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        match self.inner.try_start(task, AdmitMode::Refuse) {
            Admitted::Ticket(ticket) => Ok(ticket),
            Admitted::Rejected(err) => Err(err),
            // Not produced in `Refuse` mode.
            Admitted::MustWait(..) => Err(AdmitError::Full),
        }
    }

    /// Waits for all running tasks to complete.
    ///
    /// Returns immediately if nothing is running. Callers are not prevented
    /// from admitting more tasks concurrently, so there is no guarantee the
    /// queue is still empty by the time this returns.
    pub async fn wait(&self) {
        let released = {
            let mut state = self.inner.state.lock();
            if state.running == 0 {
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.drain_waiters.push(tx);
            rx
        };
        let _ = released.await;
    }

    /// Stops the queue and waits for it to drain.
    ///
    /// New top-level admissions fail with [`AdmitError::Stopped`] from this
    /// point on; tasks already running, already queued, or already blocked
    /// inside [`admit`](TaskQueue::admit) keep draining and are awaited.
    /// Undo with [`start`](TaskQueue::start).
    pub async fn stop(&self) {
        self.inner.state.lock().stopped = true;
        self.wait().await;
    }

    /// Clears the stopped flag. No effect if the queue is not stopped.
    pub fn start(&self) {
        self.inner.state.lock().stopped = false;
    }

    /// Reports whether the queue is at capacity: running tasks plus slot
    /// demand have reached `size`. Pure observation.
    pub fn is_full(&self) -> bool {
        let state = self.inner.state.lock();
        state.running + state.slot_waiters.len() >= self.inner.size
    }

    /// Reports whether [`stop`](TaskQueue::stop) is in effect.
    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock().stopped
    }

    /// Number of currently executing tasks.
    pub fn running_count(&self) -> usize {
        self.inner.state.lock().running
    }

    /// Name of the queue, as configured.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        records: std::sync::Mutex<Vec<(Vec<String>, Option<usize>)>>,
    }

    impl LogSink for RecordingSink {
        fn is_level_enabled(&self, _tag: &str) -> bool {
            true
        }

        fn log(&self, tags: &[&str], record: &LogRecord<'_>) {
            self.records
                .lock()
                .unwrap()
                .push((tags.iter().map(|t| t.to_string()).collect(), record.task_count));
        }
    }

    fn queue(size: usize, workers: usize) -> TaskQueue {
        TaskQueue::new(QueueConfig {
            name: "test".into(),
            size: Some(size),
            workers: Some(workers),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_spurious_completion_clamps_counter() {
        let q = queue(1, 1);

        // Completion path fired with nothing admitted: must clamp at zero,
        // twice in a row, without breaking later admissions.
        q.inner.task_finished();
        q.inner.task_finished();
        assert_eq!(q.running_count(), 0);

        let ticket = q.admit(|| async { 7 }).await.unwrap();
        assert_eq!(ticket.await.unwrap(), 7);
        assert_eq!(q.running_count(), 0);
    }

    #[tokio::test]
    async fn test_counter_fault_logs_completion_then_error() {
        let sink = Arc::new(RecordingSink::default());
        let q = TaskQueue::with_logger(
            QueueConfig {
                name: "faulty".into(),
                size: Some(1),
                workers: Some(1),
            },
            sink.clone(),
        )
        .unwrap();

        q.inner.task_finished();

        // Sinks see every completion: the finished record carries the
        // clamped count, the error record follows it.
        let records = sink.records.lock().unwrap().clone();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], (vec![LOG_TAG.to_string()], Some(0)));
        assert_eq!(
            records[1],
            (vec![ERROR_TAG.to_string(), LOG_TAG.to_string()], None)
        );
    }

    #[tokio::test]
    async fn test_admit_fails_while_stopped_until_start() {
        let q = queue(1, 1);

        q.stop().await;
        assert!(q.is_stopped());
        assert_eq!(q.admit(|| async {}).await.unwrap_err(), AdmitError::Stopped);
        assert_eq!(q.try_admit(|| async {}).unwrap_err(), AdmitError::Stopped);

        q.start();
        assert!(!q.is_stopped());
        let ticket = q.admit(|| async { "ok" }).await.unwrap();
        assert_eq!(ticket.await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_start_is_idempotent_when_not_stopped() {
        let q = queue(1, 1);
        q.start();
        assert!(!q.is_stopped());
        assert!(q.admit(|| async {}).await.is_ok());
    }

    #[tokio::test]
    async fn test_fullness_counts_queued_demand() {
        let q = queue(2, 1);
        let (gate_tx, gate_rx) = oneshot::channel::<()>();

        let first = q
            .admit(move || async move {
                let _ = gate_rx.await;
            })
            .await
            .unwrap();
        assert!(!q.is_full());

        // Worker saturated, size headroom: queued without blocking, and the
        // queued demand counts toward fullness.
        let second = q.admit(|| async {}).await.unwrap();
        assert!(q.is_full());
        assert_eq!(q.try_admit(|| async {}).unwrap_err(), AdmitError::Full);

        gate_tx.send(()).unwrap();
        first.await.unwrap();
        second.await.unwrap();
        assert!(!q.is_full());
        assert_eq!(q.running_count(), 0);
    }
}
