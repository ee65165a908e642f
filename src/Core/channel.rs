// Channel tags attached to every polled message

use std::fmt;

/// The kernel channel a message arrived on.
///
/// The tag is attached by the poller at receive time and travels next to the
/// message until the event loop routes it. It is never stored on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Control requests (interrupt, shutdown, debug).
    Control,
    /// Shell requests (execute, complete, inspect).
    Shell,
}

impl Channel {
    /// Number of channel variants.
    pub const COUNT: usize = 2;

    /// Every channel, in service priority order. Control is served first.
    pub const ALL: [Channel; Channel::COUNT] = [Channel::Control, Channel::Shell];

    /// Dense index in `0..Channel::COUNT`, for per-channel tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Control => 0,
            Channel::Shell => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Control => "control",
            Channel::Shell => "shell",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
