// Shared state between the controller and the worker thread: the stop flag,
// the lifecycle state and the forwarding counters. All of it is atomic.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

use crate::Core::Channel;

/// Lifecycle of one worker bridge. Strictly forward; `Stopped` is terminal.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Created = 0,
    Running = 1,
    StopRequested = 2,
    Stopped = 3,
}

impl BridgeState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => BridgeState::Created,
            1 => BridgeState::Running,
            2 => BridgeState::StopRequested,
            _ => BridgeState::Stopped,
        }
    }
}

/// Point-in-time copy of a bridge's counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Messages handed to the dispatcher, per [`Channel::index`].
    pub forwarded: [u64; Channel::COUNT],
    /// Polls that timed out with nothing to forward.
    pub idle_polls: u64,
    /// Poll errors seen, transient ones included.
    pub poll_errors: u64,
}

impl BridgeStats {
    pub fn forwarded_on(&self, channel: Channel) -> u64 {
        self.forwarded[channel.index()]
    }

    pub fn total_forwarded(&self) -> u64 {
        self.forwarded.iter().sum()
    }
}

/// State shared by a bridge handle and its worker thread.
pub(crate) struct Shared {
    /// Set once, never reset. The worker reads it at the top of every iteration.
    stop: CachePadded<AtomicBool>,
    state: AtomicU8,
    forwarded: [AtomicU64; Channel::COUNT],
    idle_polls: AtomicU64,
    poll_errors: AtomicU64,
}

impl Shared {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: CachePadded::new(AtomicBool::new(false)),
            state: AtomicU8::new(BridgeState::Created as u8),
            forwarded: [AtomicU64::new(0), AtomicU64::new(0)],
            idle_polls: AtomicU64::new(0),
            poll_errors: AtomicU64::new(0),
        })
    }

    #[inline]
    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Sets the stop flag and advances the state. Returns `false` if the flag
    /// was already set.
    pub(crate) fn request_stop(&self) -> bool {
        if self.stop.swap(true, Ordering::AcqRel) {
            return false;
        }
        // A bridge that never ran has nothing to wind down.
        if self
            .transition(BridgeState::Created, BridgeState::Stopped)
            .is_err()
        {
            let _ = self.transition(BridgeState::Running, BridgeState::StopRequested);
        }
        true
    }

    pub(crate) fn state(&self) -> BridgeState {
        BridgeState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Compare-and-swap on the lifecycle state. On failure returns the state found.
    pub(crate) fn transition(&self, from: BridgeState, to: BridgeState) -> Result<(), BridgeState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(BridgeState::from_u8)
    }

    pub(crate) fn mark_stopped(&self) {
        self.state.store(BridgeState::Stopped as u8, Ordering::Release);
    }

    pub(crate) fn record_forwarded(&self, channel: Channel) {
        self.forwarded[channel.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_idle(&self) {
        self.idle_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_poll_error(&self) {
        self.poll_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stats(&self) -> BridgeStats {
        BridgeStats {
            forwarded: [
                self.forwarded[0].load(Ordering::Relaxed),
                self.forwarded[1].load(Ordering::Relaxed),
            ],
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
        }
    }
}

/// Detached handle that can request a stop from any thread.
#[derive(Clone)]
pub struct StopHandle {
    pub(crate) shared: Arc<Shared>,
}

impl StopHandle {
    /// Idempotent and non-blocking. Does not wait for the worker to exit.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop_requested()
    }

    pub fn state(&self) -> BridgeState {
        self.shared.state()
    }
}
