// In-process multi-channel transport. One unbounded queue per channel,
// polled with a bounded wait the same way a socket poller would be.

use std::time::Duration;

use crossbeam_channel::{Receiver, Select, Sender, TryRecvError};

use super::channel::Channel;
use super::error::{DispatchError, PollError};
use super::poller::{Polled, Poller};

/// Creates a connected feeder/poller pair.
pub fn queue_pair<M: Send + 'static>() -> (QueueFeeder<M>, QueuePoller<M>) {
    let (control_tx, control_rx) = crossbeam_channel::unbounded();
    let (shell_tx, shell_rx) = crossbeam_channel::unbounded();
    (
        QueueFeeder {
            senders: [control_tx, shell_tx],
        },
        QueuePoller {
            receivers: [control_rx, shell_rx],
        },
    )
}

/// Sending half. Clone it to feed from several threads.
pub struct QueueFeeder<M> {
    senders: [Sender<M>; Channel::COUNT],
}

impl<M> Clone for QueueFeeder<M> {
    fn clone(&self) -> Self {
        Self {
            senders: self.senders.clone(),
        }
    }
}

impl<M> QueueFeeder<M> {
    /// Queues `message` on `channel`. Never blocks.
    pub fn send(&self, channel: Channel, message: M) -> Result<(), DispatchError<M>> {
        self.senders[channel.index()]
            .send(message)
            .map_err(|err| DispatchError {
                message: err.into_inner(),
                channel,
            })
    }

    /// Messages queued on `channel` and not yet polled.
    pub fn backlog(&self, channel: Channel) -> usize {
        self.senders[channel.index()].len()
    }
}

/// Receiving half, handed to the worker bridge.
pub struct QueuePoller<M> {
    receivers: [Receiver<M>; Channel::COUNT],
}

impl<M> QueuePoller<M> {
    /// Returns the first ready message in channel priority order.
    ///
    /// `Err(())` once every channel is empty and disconnected.
    fn try_ready(&self) -> Result<Option<Polled<M>>, ()> {
        let mut disconnected = 0;
        for channel in Channel::ALL {
            match self.receivers[channel.index()].try_recv() {
                Ok(message) => return Ok(Some((message, channel))),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => disconnected += 1,
            }
        }
        if disconnected == Channel::COUNT {
            Err(())
        } else {
            Ok(None)
        }
    }

    fn wait(&self, timeout: Duration) -> Result<Option<Polled<M>>, PollError> {
        let mut select = Select::new();
        for receiver in &self.receivers {
            select.recv(receiver);
        }

        let oper = match select.select_timeout(timeout) {
            Ok(oper) => oper,
            Err(_) => return Ok(None),
        };

        let channel = Channel::ALL[oper.index()];
        match oper.recv(&self.receivers[channel.index()]) {
            Ok(message) => Ok(Some((message, channel))),
            // This channel is closed; the others may still hold messages.
            Err(_) => self.try_ready().map_err(|()| PollError::Disconnected),
        }
    }
}

impl<M: Send + 'static> Poller for QueuePoller<M> {
    type Message = M;

    fn poll(&mut self, timeout: Duration) -> Result<Option<Polled<M>>, PollError> {
        match self.try_ready() {
            Ok(Some(ready)) => Ok(Some(ready)),
            Ok(None) => self.wait(timeout),
            Err(()) => Err(PollError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_is_served_before_shell_when_both_ready() {
        let (feeder, mut poller) = queue_pair();
        feeder.send(Channel::Shell, "s").unwrap();
        feeder.send(Channel::Control, "c").unwrap();

        let first = poller.poll(Duration::from_millis(10)).unwrap();
        assert_eq!(first, Some(("c", Channel::Control)));
        let second = poller.poll(Duration::from_millis(10)).unwrap();
        assert_eq!(second, Some(("s", Channel::Shell)));
    }

    #[test]
    fn empty_queue_times_out() {
        let (_feeder, mut poller) = queue_pair::<u32>();
        assert_eq!(poller.poll(Duration::from_millis(5)).unwrap(), None);
    }
}
