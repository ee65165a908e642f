// src/Bridge/worker.rs

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use super::builder::{BridgeConfig, PollErrorPolicy};
use super::event_loop::Dispatcher;
use super::state::{BridgeState, BridgeStats, Shared, StopHandle};
use crate::Core::{BridgeError, Channel, PollError, Poller};

/// Drains a [`Poller`] on a dedicated thread and forwards every message to an
/// event loop through a [`Dispatcher`].
///
/// A bridge runs once: `Created -> Running -> StopRequested -> Stopped`.
/// Dropping it requests a stop and joins the worker thread.
pub struct WorkerBridge<P: Poller> {
    pub(crate) config: BridgeConfig,
    pub(crate) shared: Arc<Shared>,
    /// Moved into the worker thread by `start`.
    parts: Option<(P, Dispatcher<P::Message>)>,
    handle: Option<JoinHandle<Result<(), BridgeError>>>,
    outcome: Option<Result<(), BridgeError>>,
}

impl<P: Poller> WorkerBridge<P> {
    /// Creates a bridge with the default configuration.
    pub fn new(poller: P, dispatcher: Dispatcher<P::Message>) -> Self {
        Self::with_config(poller, dispatcher, BridgeConfig::default())
    }

    pub(crate) fn with_config(
        poller: P,
        dispatcher: Dispatcher<P::Message>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            config,
            shared: Shared::new(),
            parts: Some((poller, dispatcher)),
            handle: None,
            outcome: None,
        }
    }

    /// Launches the worker thread.
    ///
    /// # Returns
    /// * `Ok(())` once the thread is running
    /// * `Err(BridgeError::AlreadyStarted)` if called twice
    /// * `Err(BridgeError::AlreadyStopped)` if the bridge was stopped or joined first
    /// * `Err(BridgeError::Spawn)` if the OS refused the thread
    pub fn start(&mut self) -> Result<(), BridgeError> {
        if let Err(found) = self
            .shared
            .transition(BridgeState::Created, BridgeState::Running)
        {
            return Err(match found {
                BridgeState::Stopped => BridgeError::AlreadyStopped,
                _ => BridgeError::AlreadyStarted,
            });
        }
        let Some((poller, dispatcher)) = self.parts.take() else {
            return Err(BridgeError::AlreadyStarted);
        };

        let worker = Worker {
            poller,
            dispatcher,
            shared: Arc::clone(&self.shared),
            poll_timeout: self.config.poll_timeout,
            error_policy: self.config.error_policy,
        };

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                info!(
                    thread = %self.config.thread_name,
                    poll_timeout = ?self.config.poll_timeout,
                    "worker bridge started"
                );
                self.handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                error!(thread = %self.config.thread_name, error = %err, "failed to spawn worker thread");
                self.shared.request_stop();
                self.shared.mark_stopped();
                let err = BridgeError::spawn(err);
                self.outcome = Some(Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Asks the worker to stop after its current iteration.
    ///
    /// Idempotent, non-blocking, callable from any thread through a shared
    /// reference or a [`StopHandle`]. Does not join.
    pub fn request_stop(&self) {
        if self.shared.request_stop() {
            debug!(thread = %self.config.thread_name, "stop requested");
        }
    }

    /// Blocks until the worker thread has exited.
    ///
    /// Returns the error that ended the loop, if any. Later calls return the
    /// same outcome. Joining a bridge that was never started marks it stopped.
    pub fn join(&mut self) -> Result<(), BridgeError> {
        if let Some(handle) = self.handle.take() {
            let outcome = match handle.join() {
                Ok(result) => result,
                Err(_) => {
                    error!(thread = %self.config.thread_name, "worker thread panicked");
                    Err(BridgeError::WorkerPanicked)
                }
            };
            self.shared.mark_stopped();
            info!(
                thread = %self.config.thread_name,
                ok = outcome.is_ok(),
                "worker bridge stopped"
            );
            self.outcome = Some(outcome);
        } else if self.outcome.is_none() {
            self.shared.request_stop();
            self.shared.mark_stopped();
            // Release the dispatcher so the event loop sees the queue close.
            self.parts = None;
            self.outcome = Some(Ok(()));
        }
        self.outcome.clone().unwrap_or(Ok(()))
    }

    /// `request_stop` followed by `join`.
    pub fn shutdown(&mut self) -> Result<(), BridgeError> {
        self.request_stop();
        self.join()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.shared.state()
    }

    pub fn stats(&self) -> BridgeStats {
        self.shared.stats()
    }

    /// The error stored by the last `join`, if the loop ended on one.
    pub fn last_error(&self) -> Option<&BridgeError> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub(crate) fn is_joined(&self) -> bool {
        self.handle.is_none() && self.outcome.is_some()
    }
}

impl<P: Poller> Drop for WorkerBridge<P> {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.request_stop();
        if let Err(err) = self.join() {
            warn!(thread = %self.config.thread_name, error = %err, "worker bridge ended with error");
        }
    }
}

/// Everything the worker thread owns.
struct Worker<P: Poller> {
    poller: P,
    dispatcher: Dispatcher<P::Message>,
    shared: Arc<Shared>,
    poll_timeout: Duration,
    error_policy: PollErrorPolicy,
}

/// Marks the bridge stopped however the worker thread exits, panics included.
struct ExitGuard<'a>(&'a Shared);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.request_stop();
        self.0.mark_stopped();
    }
}

impl<P: Poller> Worker<P> {
    fn run(mut self) -> Result<(), BridgeError> {
        let shared = Arc::clone(&self.shared);
        let _guard = ExitGuard(&shared);
        self.poll_loop()
    }

    fn poll_loop(&mut self) -> Result<(), BridgeError> {
        while !self.shared.stop_requested() {
            match self.poller.poll(self.poll_timeout) {
                // Forwarded even if a stop arrived during the poll.
                Ok(Some((message, channel))) => self.forward(message, channel)?,
                Ok(None) => {
                    self.shared.record_idle();
                    trace!("poll timed out");
                }
                Err(err) => self.on_poll_error(err)?,
            }
        }
        debug!("stop observed; leaving poll loop");
        Ok(())
    }

    fn forward(&self, message: P::Message, channel: Channel) -> Result<(), BridgeError> {
        match self.dispatcher.dispatch(message, channel) {
            Ok(()) => {
                self.shared.record_forwarded(channel);
                debug!(%channel, "forwarded message");
                Ok(())
            }
            Err(err) => {
                error!(channel = %err.channel, "event loop dropped; stopping bridge");
                Err(BridgeError::ConsumerGone {
                    channel: err.channel,
                })
            }
        }
    }

    fn on_poll_error(&self, err: PollError) -> Result<(), BridgeError> {
        self.shared.record_poll_error();
        if err.is_transient() {
            debug!(error = %err, "transient poll error; retrying");
            return Ok(());
        }
        match self.error_policy {
            PollErrorPolicy::Stop => {
                error!(error = %err, "poll failed; stopping bridge");
                Err(BridgeError::Poll(err))
            }
            PollErrorPolicy::Continue => {
                warn!(error = %err, "poll failed; retrying after one interval");
                if !self.shared.stop_requested() {
                    thread::sleep(self.poll_timeout);
                }
                Ok(())
            }
        }
    }
}
