#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kernel_bridge::{Channel, PollError, Poller, StopHandle};
use parking_lot::Mutex;

/// Filled in after the bridge is built, read by the poller on its thread.
pub type StopSlot = Arc<Mutex<Option<StopHandle>>>;

pub enum Step<M> {
    Deliver(M, Channel),
    Idle,
    Fail(PollError),
    /// Request a stop from inside the poll, then return the message anyway.
    StopThenDeliver(StopSlot, M, Channel),
    /// Request a stop from inside the poll, then fail.
    StopThenFail(StopSlot, PollError),
    Panic,
}

/// Plays back a fixed script, then idles for the full timeout on every poll.
pub struct ScriptedPoller<M> {
    steps: VecDeque<Step<M>>,
    polls: Arc<AtomicUsize>,
}

impl<M> ScriptedPoller<M> {
    pub fn new(steps: impl IntoIterator<Item = Step<M>>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delivering(messages: impl IntoIterator<Item = (M, Channel)>) -> Self {
        Self::new(messages.into_iter().map(|(m, c)| Step::Deliver(m, c)))
    }

    pub fn idle() -> Self {
        Self::new([])
    }

    pub fn poll_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.polls)
    }
}

impl<M: Send + 'static> Poller for ScriptedPoller<M> {
    type Message = M;

    fn poll(&mut self, timeout: Duration) -> Result<Option<(M, Channel)>, PollError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front() {
            Some(Step::Deliver(message, channel)) => Ok(Some((message, channel))),
            Some(Step::Idle) | None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
            Some(Step::Fail(err)) => Err(err),
            Some(Step::StopThenDeliver(slot, message, channel)) => {
                if let Some(handle) = slot.lock().as_ref() {
                    handle.request_stop();
                }
                Ok(Some((message, channel)))
            }
            Some(Step::StopThenFail(slot, err)) => {
                if let Some(handle) = slot.lock().as_ref() {
                    handle.request_stop();
                }
                Err(err)
            }
            Some(Step::Panic) => panic!("scripted poller panic"),
        }
    }
}

/// Random channel sequence from a fixed seed.
pub fn random_channels(seed: u64, n: usize) -> Vec<Channel> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n)
        .map(|_| if rng.bool() { Channel::Control } else { Channel::Shell })
        .collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
