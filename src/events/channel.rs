//! Run-scoped event streams.
//!
//! Each analysis run owns the [`EventSender`] it was started with; the
//! stream ends when that run's control thread lets go of it. Observers
//! hold the matching [`EventReceiver`] and may stop early at the run's
//! terminal event.

use crossbeam_channel::{Receiver, Sender};
use std::iter;

use super::Event;

/// Create an unbounded stream for one run.
pub fn channel() -> (EventSender, EventReceiver) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (EventSender { inner: sender }, EventReceiver { inner: receiver })
}

/// Create a stream that holds at most `capacity` undelivered events.
///
/// The run's control thread blocks while the observer is that far behind.
pub fn bounded_channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity);
    (EventSender { inner: sender }, EventReceiver { inner: receiver })
}

/// A sender with no observer, for headless runs.
pub fn null_sender() -> EventSender {
    channel().0
}

/// Producer half, owned by a run's control thread
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Deliver `event` to the observer.
    ///
    /// Returns `false` when nobody is listening any more; the run carries
    /// on regardless.
    pub fn send(&self, event: Event) -> bool {
        self.inner.send(event).is_ok()
    }
}

/// Observer half of a run's event stream
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Next event, or `None` once the run has dropped its sender
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Every event until the run drops its sender
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Events up to and including the run's terminal event.
    ///
    /// Stops at `Completed` or `Cancelled` even if the sender is still
    /// alive, so an observer can react to the outcome (for example by
    /// starting the next run) without waiting for the control thread.
    pub fn until_terminal(&self) -> impl Iterator<Item = Event> + '_ {
        let mut done = false;
        iter::from_fn(move || {
            if done {
                return None;
            }
            let event = self.inner.recv().ok()?;
            done = event.is_terminal();
            Some(event)
        })
    }
}
