// In demos/kernel_loop.rs
//
// A simulated kernel feeds shell and control requests into a queue transport.
// The bridge forwards them onto the main thread's event loop, which plays the
// part of the GUI. Ctrl+C or a `shutdown_request` ends the run.
use kernel_bridge::{queue_pair, BridgeBuilder, Channel, EventLoop};
use std::env;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let num_requests: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);

    let (feeder, poller) = queue_pair::<String>();
    let mut event_loop = EventLoop::new();

    let mut bridge = BridgeBuilder::new()
        .with_thread_name("xq-poller")
        .with_poll_timeout(Duration::from_millis(10))
        .build(poller, event_loop.dispatcher())?;

    let stop = bridge.stop_handle();
    ctrlc::set_handler(move || stop.request_stop())?;

    let mut executed = 0usize;
    event_loop.on_channel(Channel::Shell, move |request| {
        executed += 1;
        println!("[shell #{executed}] {request}");
    });
    let stop = bridge.stop_handle();
    event_loop.on_channel(Channel::Control, move |request| {
        println!("[control] {request}");
        if request == "shutdown_request" {
            stop.request_stop();
        }
    });

    bridge.start()?;

    let kernel = std::thread::spawn(move || {
        for i in 0..num_requests {
            let request = format!("execute_request {i}");
            if feeder.send(Channel::Shell, request).is_err() {
                return;
            }
            if i % 5 == 4 {
                let _ = feeder.send(Channel::Control, "interrupt_request".to_string());
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        let _ = feeder.send(Channel::Control, "shutdown_request".to_string());
        // Keep the transport open until the bridge stops on its own.
        std::thread::sleep(Duration::from_millis(200));
    });

    let delivered = event_loop.exec();
    bridge.join()?;
    kernel.join().map_err(|_| "kernel thread panicked")?;

    println!("Delivered {delivered} messages; {:?}", bridge.stats());
    Ok(())
}
