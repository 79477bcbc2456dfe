//! # taskgate
//!
//! **Taskgate** is a bounded-concurrency admission gate for async tasks.
//!
//! Callers submit units of work and the gate decides, based on two limits,
//! whether each task runs immediately, is queued for later, or whether the
//! submitting caller has to wait before the task is even accepted. It is a
//! building block for batch runners, crawlers, and anything that needs to
//! cap in-flight work with backpressure at the edge.
//!
//! ## Architecture
//! ```text
//!  admit(task) ──► Admission Controller
//!                    │
//!                    ├─ free worker ───────────► spawn task ──► Ticket
//!                    │                               │
//!                    ├─ size headroom ─► Pending ────┼────────► Ticket (now)
//!                    │                   (FIFO)      │           task later
//!                    │                               ▼
//!                    └─ full ─► Blocked ◄── Completion Notifier
//!                               (suspend)      │ releases one slot-waiter
//!                                              │ per completion, FIFO; or
//!                                              ▼
//!                                         drain-waiters (wait()/stop())
//!                                         all released at running == 0
//! ```
//!
//! ## Limits
//! | Limit     | Meaning                                                      |
//! |-----------|--------------------------------------------------------------|
//! | `workers` | maximum number of tasks *executing* concurrently             |
//! | `size`    | maximum number of tasks *in the system* (running + accepted) |
//!
//! With `workers < size`, the gap between them is a non-blocking accept
//! window: admissions in that band return a [`Ticket`] right away and the
//! task starts once earlier work completes, in submission order.
//!
//! ## Example
//! ```rust
//! use taskgate::{QueueConfig, TaskQueue};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let queue = TaskQueue::new(QueueConfig {
//!         name: "jobs".into(),
//!         size: Some(2),
//!         workers: Some(2),
//!     })?;
//!
//!     let a = queue.admit(|| async { 1 }).await?;
//!     let b = queue.admit(|| async { 2 }).await?;
//!
//!     // Awaiting an admit() only waits for acceptance; awaiting the
//!     // Ticket waits for the task itself.
//!     assert_eq!(a.await? + b.await?, 3);
//!
//!     queue.wait().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Non-goals
//! Priority scheduling, cancellation of admitted tasks, persistence of
//! queued tasks, and cross-process coordination are out of scope. Waiters
//! are served strictly first-in-first-out; there is no other fairness
//! machinery.

mod config;
mod error;
mod logging;
mod queue;

// ---- Public re-exports ----

pub use config::QueueConfig;
pub use error::{AdmitError, ConfigError, TaskAborted};
pub use logging::{LogRecord, LogSink, StdoutLog, ERROR_TAG, LOG_TAG};
pub use queue::{TaskQueue, Ticket};
