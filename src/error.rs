//! Error types used by the admission gate.
//!
//! This module defines:
//!
//! - [`ConfigError`] — invalid construction options; fatal to construction.
//! - [`AdmitError`] — synchronous admission failures (`Stopped`, `Full`).
//! - [`TaskAborted`] — ticket-side error for a task that terminated without
//!   producing a result.
//!
//! Task failures are never queue errors: whatever a task's future resolves
//! to travels through its [`Ticket`](crate::Ticket) untouched.

use thiserror::Error;

/// Errors raised while constructing a [`TaskQueue`](crate::TaskQueue).
///
/// Construction never partially succeeds; a queue either validates fully or
/// is not created.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `size` was provided but is below the minimum of 1.
    #[error("queue size must be at least 1, got {0}")]
    SizeTooSmall(usize),

    /// `workers` was provided but is below the minimum of 1.
    #[error("worker limit must be at least 1, got {0}")]
    WorkersTooSmall(usize),

    /// `workers` exceeds `size`, which would make the fullness check
    /// inconsistent with the worker limit.
    #[error("worker limit {workers} exceeds queue size {size}")]
    WorkersExceedSize {
        /// The configured queue size.
        size: usize,
        /// The configured worker limit.
        workers: usize,
    },
}

/// Errors returned by [`TaskQueue::admit`](crate::TaskQueue::admit) and
/// [`TaskQueue::try_admit`](crate::TaskQueue::try_admit).
///
/// `Stopped` is expected control flow during graceful shutdown, not a fault.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    /// The queue is stopped; no new top-level admissions are accepted until
    /// [`start`](crate::TaskQueue::start) is called.
    #[error("queue is stopped")]
    Stopped,

    /// The queue is at capacity. Only returned by `try_admit`; `admit`
    /// blocks instead.
    #[error("queue is full")]
    Full,
}

impl AdmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmitError::Stopped => "queue_stopped",
            AdmitError::Full => "queue_full",
        }
    }
}

/// The task behind a [`Ticket`](crate::Ticket) terminated without producing
/// a result (it panicked). The slot it held has already been released.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("task terminated without producing a result")]
pub struct TaskAborted;
