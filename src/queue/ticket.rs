//! # Admission ticket.
//!
//! [`Ticket<T>`] is the handle returned by a successful admission. Awaiting
//! it yields the task's own output, after the queue has already accounted
//! for the completion. The queue keeps no reference to the ticket once it is
//! returned; dropping it never affects the task.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::TaskAborted;

/// Deferred outcome of an admitted task.
///
/// Resolves to `Ok(output)` once the task completes, or to
/// `Err(`[`TaskAborted`]`)` if the task terminated without producing a
/// result (it panicked). In both cases the slot the task held has already
/// been released by the time the ticket settles.
///
/// The queue never inspects the output: a task that wants to report failure
/// should resolve to a `Result` of its own and the caller will receive it
/// unchanged through the ticket.
pub struct Ticket<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Ticket<T> {
    pub(super) fn new(rx: oneshot::Receiver<T>) -> Self {
        Self { rx }
    }
}

impl<T> Future for Ticket<T> {
    type Output = Result<T, TaskAborted>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|out| out.map_err(|_| TaskAborted))
    }
}

impl<T> fmt::Debug for Ticket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket").finish_non_exhaustive()
    }
}
