use std::thread;
use std::time::{Duration, Instant};

use kernel_bridge::{queue_pair, Channel, PollError, Poller};

#[test]
fn drains_buffered_messages_before_reporting_disconnect() {
    let (feeder, mut poller) = queue_pair();
    feeder.send(Channel::Shell, 1u32).unwrap();
    feeder.send(Channel::Shell, 2u32).unwrap();
    feeder.send(Channel::Control, 3u32).unwrap();
    drop(feeder);

    let timeout = Duration::from_millis(10);
    assert_eq!(poller.poll(timeout).unwrap(), Some((3, Channel::Control)));
    assert_eq!(poller.poll(timeout).unwrap(), Some((1, Channel::Shell)));
    assert_eq!(poller.poll(timeout).unwrap(), Some((2, Channel::Shell)));
    assert!(matches!(poller.poll(timeout), Err(PollError::Disconnected)));
}

#[test]
fn wait_is_bounded_by_timeout() {
    let (_feeder, mut poller) = queue_pair::<u32>();
    let started = Instant::now();
    assert_eq!(poller.poll(Duration::from_millis(15)).unwrap(), None);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(10), "woke too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(500), "overslept: {elapsed:?}");
}

#[test]
fn message_arriving_mid_wait_is_returned_promptly() {
    let (feeder, mut poller) = queue_pair::<&'static str>();
    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        feeder.send(Channel::Shell, "kernel_info_request").unwrap();
        feeder
    });

    let started = Instant::now();
    let polled = poller.poll(Duration::from_secs(2)).unwrap();
    assert_eq!(polled, Some(("kernel_info_request", Channel::Shell)));
    assert!(started.elapsed() < Duration::from_secs(1));
    let _feeder = sender.join().unwrap();
}

#[test]
fn send_after_poller_dropped_returns_message() {
    let (feeder, poller) = queue_pair::<Vec<u8>>();
    drop(poller);
    let err = feeder.send(Channel::Control, vec![1, 2, 3]).unwrap_err();
    assert_eq!(err.channel, Channel::Control);
    assert_eq!(err.message, vec![1, 2, 3]);
}

#[test]
fn backlog_counts_unpolled_messages_per_channel() {
    let (feeder, mut poller) = queue_pair();
    let extra = feeder.clone();
    feeder.send(Channel::Shell, 'a').unwrap();
    extra.send(Channel::Shell, 'b').unwrap();
    extra.send(Channel::Control, 'c').unwrap();

    assert_eq!(feeder.backlog(Channel::Shell), 2);
    assert_eq!(feeder.backlog(Channel::Control), 1);

    poller.poll(Duration::from_millis(1)).unwrap();
    assert_eq!(feeder.backlog(Channel::Control), 0);
    assert_eq!(extra.backlog(Channel::Shell), 2);
}
