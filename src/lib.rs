// Module naming follows project convention (Core = transport-facing types, Bridge = threads and delivery)
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Bridge;
#[allow(non_snake_case)]
pub mod Debug;

pub use Bridge::{
    BridgeBuilder, BridgeConfig, BridgeState, BridgeStats, Dispatcher, EventLoop,
    PollErrorPolicy, StopHandle, WorkerBridge,
};
pub use Core::{
    poller_fn, queue_pair, BridgeError, Channel, DispatchError, PollError, Poller, QueueFeeder,
    QueuePoller,
};
