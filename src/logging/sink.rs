//! # Logging collaborator contract.
//!
//! The queue treats its logger as a passive sink: it is handed structured
//! [`LogRecord`]s and must never affect control flow. All queue records are
//! tagged with [`LOG_TAG`]; defensive faults additionally carry an `"error"`
//! tag.
//!
//! If [`LogSink::is_level_enabled`] reports [`LOG_TAG`] disabled at
//! construction time, the queue drops the sink entirely, so disabled logging
//! costs nothing on the admission and completion paths.

/// Tag attached to every record the queue emits.
pub const LOG_TAG: &str = "task_queue";

/// Tag attached, in addition to [`LOG_TAG`], to defensive-fault records.
pub const ERROR_TAG: &str = "error";

/// Structured record handed to a [`LogSink`].
#[derive(Clone, Debug)]
pub struct LogRecord<'a> {
    /// Human-readable description of the observation.
    pub message: String,

    /// Name of the queue that produced the record.
    pub name: &'a str,

    /// Number of currently executing tasks, where the observation has one
    /// (post-increment for starts, post-decrement for finishes).
    pub task_count: Option<usize>,
}

/// Passive logging sink invoked by the queue with structured records.
///
/// Implementations must be cheap and non-blocking; the queue may call
/// [`log`](LogSink::log) from task completion paths.
pub trait LogSink: Send + Sync {
    /// Reports whether records carrying `tag` are worth producing.
    ///
    /// Checked once, at queue construction. A sink that returns `false` for
    /// [`LOG_TAG`] is discarded and never called again.
    fn is_level_enabled(&self, tag: &str) -> bool;

    /// Receives one structured record. `tags` always contains [`LOG_TAG`].
    fn log(&self, tags: &[&str], record: &LogRecord<'_>);
}
