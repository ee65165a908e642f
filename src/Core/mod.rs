pub mod channel;
pub mod error;
pub mod poller;
pub mod queue_poller;

pub use channel::Channel;
pub use error::{BridgeError, DispatchError, PollError};
pub use poller::{poller_fn, PollFn, Polled, Poller};
pub use queue_poller::{queue_pair, QueueFeeder, QueuePoller};
