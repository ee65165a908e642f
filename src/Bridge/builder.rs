use std::time::Duration;

use super::event_loop::Dispatcher;
use super::worker::WorkerBridge;
use crate::Core::{BridgeError, Poller};

/// What the worker does when the poller reports a non-transient error.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PollErrorPolicy {
    /// Store the error, end the loop and surface it from `join`.
    #[default]
    Stop,
    /// Log it, wait one poll interval and poll again.
    Continue,
}

/// Settings for one worker bridge.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Upper bound on each blocking poll, and therefore on stop latency.
    pub poll_timeout: Duration,
    pub thread_name: String,
    pub error_policy: PollErrorPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(10),
            thread_name: "kernel-bridge".to_string(),
            error_policy: PollErrorPolicy::Stop,
        }
    }
}

impl BridgeConfig {
    pub(crate) fn validate(&self) -> Result<(), BridgeError> {
        if self.poll_timeout.is_zero() {
            return Err(BridgeError::InvalidConfig(
                "poll timeout must be non-zero".to_string(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(BridgeError::InvalidConfig(
                "thread name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = timeout;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn with_error_policy(mut self, policy: PollErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Builds a bridge in the `Created` state. Nothing runs until `start`.
    pub fn build<P: Poller>(
        self,
        poller: P,
        dispatcher: Dispatcher<P::Message>,
    ) -> Result<WorkerBridge<P>, BridgeError> {
        self.config.validate()?;
        Ok(WorkerBridge::with_config(poller, dispatcher, self.config))
    }

    /// Builds and starts a bridge.
    pub fn spawn<P: Poller>(
        self,
        poller: P,
        dispatcher: Dispatcher<P::Message>,
    ) -> Result<WorkerBridge<P>, BridgeError> {
        let mut bridge = self.build(poller, dispatcher)?;
        bridge.start()?;
        Ok(bridge)
    }
}
