// Single-threaded delivery side of the bridge.
//
// The worker moves each (message, channel) pair into an unbounded queue through
// a `Dispatcher`; the thread that owns the `EventLoop` pops it and passes
// ownership to the registered handler, which drops it when done.

use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{trace, warn};

use crate::Core::{Channel, DispatchError};

type Waker = Arc<dyn Fn() + Send + Sync>;
type ChannelHandler<M> = Box<dyn FnMut(M)>;
type FallbackHandler<M> = Box<dyn FnMut(M, Channel)>;

/// How often `exec` re-checks for live dispatchers while the queue is idle.
const EXEC_IDLE_CHECK: Duration = Duration::from_millis(10);

/// Cross-thread sending half of an [`EventLoop`].
pub struct Dispatcher<M> {
    tx: Sender<(M, Channel)>,
    waker: Option<Waker>,
    // One strong count per live dispatcher, plus the loop's own.
    _live: Arc<()>,
}

impl<M> Clone for Dispatcher<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
            _live: Arc::clone(&self._live),
        }
    }
}

impl<M> Dispatcher<M> {
    /// Moves `message` to the event loop and returns without waiting for it
    /// to be handled.
    pub fn dispatch(&self, message: M, channel: Channel) -> Result<(), DispatchError<M>> {
        self.tx.send((message, channel)).map_err(|err| {
            let (message, channel) = err.into_inner();
            DispatchError { message, channel }
        })?;
        if let Some(waker) = &self.waker {
            waker();
        }
        Ok(())
    }

    /// Messages dispatched and not yet taken by the event loop.
    pub fn in_flight(&self) -> usize {
        self.tx.len()
    }

    pub(crate) fn has_waker(&self) -> bool {
        self.waker.is_some()
    }
}

/// The consumer context. Bound to the thread that created it.
pub struct EventLoop<M> {
    tx: Sender<(M, Channel)>,
    live: Arc<()>,
    rx: Receiver<(M, Channel)>,
    waker: Option<Waker>,
    channel_handlers: [Option<ChannelHandler<M>>; Channel::COUNT],
    fallback: Option<FallbackHandler<M>>,
    delivered: u64,
    // Handlers may hold `Rc`/`RefCell` state, so the loop must stay put.
    _thread_bound: PhantomData<Rc<()>>,
}

impl<M> Default for EventLoop<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> EventLoop<M> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            live: Arc::new(()),
            rx,
            waker: None,
            channel_handlers: [None, None],
            fallback: None,
            delivered: 0,
            _thread_bound: PhantomData,
        }
    }

    /// Installs a hook run after every dispatch, on the dispatching thread.
    ///
    /// Use it to post a "process pending" request into a foreign event loop.
    /// Only dispatchers created after this call carry the hook.
    pub fn with_waker<F>(mut self, waker: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Routes every message on `channel` to `handler`.
    pub fn on_channel<F>(&mut self, channel: Channel, handler: F) -> &mut Self
    where
        F: FnMut(M) + 'static,
    {
        self.channel_handlers[channel.index()] = Some(Box::new(handler));
        self
    }

    /// Receives messages on channels without a dedicated handler.
    pub fn on_message<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(M, Channel) + 'static,
    {
        self.fallback = Some(Box::new(handler));
        self
    }

    /// Returns a sender for the worker side. Every dispatcher feeds the same
    /// queue for the lifetime of the loop.
    pub fn dispatcher(&mut self) -> Dispatcher<M> {
        Dispatcher {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
            _live: Arc::clone(&self.live),
        }
    }

    /// Dispatchers handed out and not yet dropped.
    pub fn live_dispatchers(&self) -> usize {
        Arc::strong_count(&self.live) - 1
    }

    /// Messages queued and not yet delivered.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Messages delivered to handlers over the lifetime of this loop.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Delivers what was queued when the call started. Never blocks.
    ///
    /// Messages dispatched meanwhile wait for the next turn so a busy worker
    /// cannot starve the rest of the loop.
    pub fn process_pending(&mut self) -> usize {
        let budget = self.rx.len();
        let mut count = 0;
        while count < budget {
            match self.rx.try_recv() {
                Ok((message, channel)) => {
                    self.deliver(message, channel);
                    count += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        count
    }

    /// Delivers messages as they arrive for `duration`.
    pub fn run_for(&mut self, duration: Duration) -> usize {
        let deadline = Instant::now() + duration;
        let mut count = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok((message, channel)) => {
                    self.deliver(message, channel);
                    count += 1;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        count
    }

    /// Delivers messages until `done()` holds or `timeout` elapses.
    ///
    /// `done` is checked before waiting and after every delivery. Returns its
    /// final value.
    pub fn run_until<F>(&mut self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if done() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.rx.recv_timeout(remaining) {
                Ok((message, channel)) => self.deliver(message, channel),
                Err(RecvTimeoutError::Timeout) => return done(),
                Err(RecvTimeoutError::Disconnected) => return done(),
            }
        }
    }

    /// Delivers until every dispatcher handed out has been dropped and the
    /// queue is empty.
    ///
    /// The loop keeps its own sender throughout, so a handler panic caught by
    /// the caller leaves the queue and every live dispatcher intact.
    pub fn exec(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.rx.recv_timeout(EXEC_IDLE_CHECK) {
                Ok((message, channel)) => {
                    self.deliver(message, channel);
                    count += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Count first: with no dispatcher left, nothing can land
                    // between the two checks.
                    if self.live_dispatchers() == 0 && self.rx.is_empty() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        count
    }

    fn deliver(&mut self, message: M, channel: Channel) {
        if let Some(handler) = self.channel_handlers[channel.index()].as_mut() {
            handler(message);
        } else if let Some(fallback) = self.fallback.as_mut() {
            fallback(message, channel);
        } else {
            warn!(%channel, "no handler registered; dropping message");
            return;
        }
        self.delivered += 1;
        trace!(%channel, delivered = self.delivered, "message delivered");
    }
}
