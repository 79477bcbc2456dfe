use std::sync::Arc;

use tokio::sync::oneshot;

use super::core::QueueInner;

/// Deferred launch for a task that was accepted while the worker limit was
/// saturated. Invoked by the completion notifier once a worker frees up,
/// after the state lock has been released; spawns the task and forwards its
/// outcome into the ticket that was already handed to the caller.
pub(super) type Job = Box<dyn FnOnce(&Arc<QueueInner>) + Send + 'static>;

/// One unit of demand for a freed slot.
///
/// Both flavors share a single FIFO queue; a completion releases exactly one
/// of them, whichever is at the front.
pub(super) enum SlotWaiter {
    /// An `admit` call suspended because the queue is at capacity.
    /// Completing the channel resumes the caller, which re-evaluates the
    /// admission decision from scratch.
    Blocked(oneshot::Sender<()>),

    /// A task accepted without blocking, waiting for a worker.
    Pending(Job),
}
