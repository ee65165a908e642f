use std::time::Duration;

use super::channel::Channel;
use super::error::PollError;

/// One classified inbound message, as returned by a successful poll.
pub type Polled<M> = (M, Channel);

/// A blocking, timeout-bounded source of inbound messages across all channels.
///
/// The worker bridge owns its poller and is the only caller of [`poll`](Poller::poll);
/// calls never overlap. The poller owns the underlying transport.
pub trait Poller: Send + 'static {
    type Message: Send + 'static;

    /// Waits up to `timeout` for the next message on any channel.
    ///
    /// # Returns
    /// * `Ok(Some((message, channel)))` if a message arrived
    /// * `Ok(None)` if the timeout elapsed first
    /// * `Err(PollError)` if the transport failed
    fn poll(&mut self, timeout: Duration) -> Result<Option<Polled<Self::Message>>, PollError>;
}

/// Adapter turning a closure into a [`Poller`].
pub struct PollFn<F> {
    f: F,
}

/// Builds a poller from `f(timeout)`.
pub fn poller_fn<M, F>(f: F) -> PollFn<F>
where
    M: Send + 'static,
    F: FnMut(Duration) -> Result<Option<Polled<M>>, PollError> + Send + 'static,
{
    PollFn { f }
}

impl<M, F> Poller for PollFn<F>
where
    M: Send + 'static,
    F: FnMut(Duration) -> Result<Option<Polled<M>>, PollError> + Send + 'static,
{
    type Message = M;

    fn poll(&mut self, timeout: Duration) -> Result<Option<Polled<M>>, PollError> {
        (self.f)(timeout)
    }
}

impl<P: Poller + ?Sized> Poller for Box<P> {
    type Message = P::Message;

    fn poll(&mut self, timeout: Duration) -> Result<Option<Polled<Self::Message>>, PollError> {
        (**self).poll(timeout)
    }
}
