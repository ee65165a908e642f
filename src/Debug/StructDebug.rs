use std::fmt;

use crate::Bridge::{Dispatcher, EventLoop, WorkerBridge};
use crate::Core::{Poller, QueueFeeder, QueuePoller};

/// Debug function for WorkerBridge
///
/// The poller and its messages stay opaque; shows the lifecycle and counters.
pub fn debug_worker_bridge<P: Poller>(
    bridge: &WorkerBridge<P>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("WorkerBridge")
        .field("poller", &"<opaque>")
        .field("thread", &bridge.config().thread_name)
        .field("poll_timeout", &bridge.config().poll_timeout)
        .field("state", &bridge.state())
        .field("stats", &bridge.stats())
        .field("joined", &bridge.is_joined())
        .field("last_error", &bridge.last_error())
        .finish()
}

pub fn debug_event_loop<M>(event_loop: &EventLoop<M>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventLoop")
        .field("pending", &event_loop.pending())
        .field("delivered", &event_loop.delivered())
        .field("live_dispatchers", &event_loop.live_dispatchers())
        .finish_non_exhaustive()
}

pub fn debug_dispatcher<M>(dispatcher: &Dispatcher<M>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dispatcher")
        .field("in_flight", &dispatcher.in_flight())
        .field("waker", &dispatcher.has_waker())
        .finish()
}

impl<P: Poller> fmt::Debug for WorkerBridge<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_worker_bridge(self, f)
    }
}

impl<M> fmt::Debug for EventLoop<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_event_loop(self, f)
    }
}

impl<M> fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_dispatcher(self, f)
    }
}

impl<M> fmt::Debug for QueueFeeder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueFeeder").finish_non_exhaustive()
    }
}

impl<M> fmt::Debug for QueuePoller<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuePoller").finish_non_exhaustive()
    }
}
