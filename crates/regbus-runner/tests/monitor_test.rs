//! Monitor screen rendering against the mock bus.

use std::time::Duration;

use regbus_engine::mock::{Fault, MockBus};
use regbus_engine::{EngineConfig, Poller, ShutdownSignal, TransactionEngine};
use regbus_protocol::commands;
use regbus_runner::monitor::{run_monitor, CLEAR_TO_END, CURSOR_HOME};

#[test]
fn test_monitor_redraws_until_shutdown() {
    let shutdown = ShutdownSignal::new();
    let stop = shutdown.clone();
    let mut reads = 0;
    // Answer 42 everywhere and stop after two full sweeps of three entries.
    let mut bus = MockBus::new().with_responder(move |_, _| {
        reads += 1;
        if reads == 6 {
            stop.raise();
        }
        vec![0, 0, 0, 42]
    });
    bus.fail_write_on(2, Fault::Io);
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());

    let entries = ["APU", "APD", "STS"]
        .iter()
        .map(|m| commands::lookup(m).unwrap())
        .collect();
    let poller = Poller::with_entries(entries, Duration::from_millis(300));

    let mut out = Vec::new();
    let sweeps = run_monitor(&poller, &mut engine, &shutdown, &mut out).unwrap();
    drop(engine);

    let screen = String::from_utf8(out).unwrap();
    // One failed write means the sixth read is in the third sweep's first entry.
    assert_eq!(sweeps, 2);
    assert_eq!(screen.matches(CURSOR_HOME).count(), 3);
    assert_eq!(screen.matches(CLEAR_TO_END).count(), 3);
    assert!(screen.contains("Description               Value      Units"));
    assert!(screen.contains("Auger Pivot Up            42         %"));
    assert!(screen.contains("Auger Pivot Down          ERROR      %"));
    assert!(screen.contains("STM32 Status              42         NA"));
    assert!(screen.ends_with("Cleaning up and exiting.\n"));
}

#[test]
fn test_monitor_exits_immediately_when_already_stopped() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());

    let shutdown = ShutdownSignal::new();
    shutdown.raise();
    let mut out = Vec::new();
    let sweeps = run_monitor(&Poller::default(), &mut engine, &shutdown, &mut out).unwrap();
    drop(engine);

    assert_eq!(sweeps, 0);
    assert!(bus.events().is_empty());
}
