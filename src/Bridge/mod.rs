mod builder;
mod event_loop;
mod state;
mod worker;

pub use builder::{BridgeBuilder, BridgeConfig, PollErrorPolicy};
pub use event_loop::{Dispatcher, EventLoop};
pub use state::{BridgeState, BridgeStats, StopHandle};
pub use worker::WorkerBridge;
