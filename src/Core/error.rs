use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

use super::channel::Channel;

/// Failure reported by a [`Poller`](super::poller::Poller) during one poll.
#[derive(Debug, Clone, Error)]
pub enum PollError {
    /// The wait was cut short (signal, spurious wake-up). Retried transparently.
    #[error("poll interrupted")]
    Interrupted,

    /// Every sender of the underlying transport is gone and nothing is buffered.
    #[error("transport disconnected")]
    Disconnected,

    /// Transport-level failure raised by the poller implementation.
    #[error("transport error: {0}")]
    Transport(#[source] Arc<dyn StdError + Send + Sync>),
}

impl PollError {
    /// Wraps an arbitrary transport error.
    pub fn transport<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        PollError::Transport(Arc::new(err))
    }

    /// Whether the worker may retry without consulting its error policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, PollError::Interrupted)
    }
}

impl From<io::Error> for PollError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Interrupted | io::ErrorKind::TimedOut => PollError::Interrupted,
            io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected => PollError::Disconnected,
            _ => PollError::transport(err),
        }
    }
}

/// Errors surfaced by the worker bridge to its controller.
///
/// `Clone` so that the outcome stored at join time can be handed out again.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("worker bridge already started")]
    AlreadyStarted,

    #[error("worker bridge already stopped; construct a new bridge to run again")]
    AlreadyStopped,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] Arc<io::Error>),

    #[error("poller failed: {0}")]
    Poll(#[from] PollError),

    #[error("event loop dropped; {channel} message could not be delivered")]
    ConsumerGone { channel: Channel },

    #[error("worker thread panicked")]
    WorkerPanicked,

    #[error("invalid bridge configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeError {
    pub(crate) fn spawn(err: io::Error) -> Self {
        BridgeError::Spawn(Arc::new(err))
    }
}

/// A dispatch that could not reach its event loop. Carries the message back.
#[derive(Debug)]
pub struct DispatchError<M> {
    pub message: M,
    pub channel: Channel,
}

impl<M> DispatchError<M> {
    pub fn into_inner(self) -> (M, Channel) {
        (self.message, self.channel)
    }
}

impl<M> fmt::Display for DispatchError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event loop is gone; {} message returned to sender", self.channel)
    }
}

impl<M: fmt::Debug> StdError for DispatchError<M> {}
