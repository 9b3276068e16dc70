//! Interactive session tests against the recording mock bus.

use std::io::Cursor;
use std::time::Duration;

use regbus_engine::mock::{BusEvent, Fault, MockBus};
use regbus_engine::{EngineConfig, TransactionEngine};
use regbus_runner::console::{run_session, spawn_line_reader, SessionEnd};
use regbus_runner::session::{DacSession, LineHandler, McuSession, RawRequest, SessionAction};
use regbus_runner::RunnerError;

fn text(out: &[u8]) -> String {
    String::from_utf8_lossy(out).into_owned()
}

// ============================================================================
// STM32 Session
// ============================================================================

#[test]
fn test_mcu_help_lists_table() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let mut out = Vec::new();
    assert_eq!(session.handle_line("h", &mut out).unwrap(), SessionAction::Continue);
    let help = text(&out);
    assert!(help.contains(" APU <value> - Auger Pivot Up"));
    assert!(help.contains(" STS <value> - STM32 Status"));
    assert!(help.contains(" Q - Quit the program"));
    drop(session);
    drop(engine);
    assert!(bus.events().is_empty());
}

#[test]
fn test_mcu_quit() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let mut out = Vec::new();
    assert_eq!(session.handle_line("Q", &mut out).unwrap(), SessionAction::Quit);
    assert_eq!(text(&out), "Exiting...\n");
}

#[test]
fn test_mcu_write_command() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let mut out = Vec::new();
    session.handle_line("LED 1", &mut out).unwrap();
    let output = text(&out);
    assert!(output.contains("Sent 4 byte(s): 00 01 00 01 to address: 0x10"));
    assert!(output.contains("User Controlled LED: 1 I/O"));
    drop(session);
    drop(engine);
    assert_eq!(bus.writes(), vec![vec![0x00, 0x01, 0x00, 0x01]]);
}

#[test]
fn test_mcu_read_ignores_value() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let mut out = Vec::new();
    session.handle_line("APU 55", &mut out).unwrap();
    drop(session);
    drop(engine);
    assert_eq!(bus.writes(), vec![vec![0x82, 0x08, 0x00, 0x00]]);
}

#[test]
fn test_mcu_input_errors_continue_without_bus_traffic() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let mut out = Vec::new();
    assert_eq!(session.handle_line("XYZ", &mut out).unwrap(), SessionAction::Continue);
    assert!(text(&out).contains("Invalid command 'XYZ'. Type 'h' for help."));

    // Mnemonics are case-sensitive.
    out.clear();
    session.handle_line("apu", &mut out).unwrap();
    assert!(text(&out).contains("Invalid command 'apu'"));

    out.clear();
    session.handle_line("PTO 12abc", &mut out).unwrap();
    assert!(text(&out).contains("invalid number '12abc'"));

    out.clear();
    session.handle_line("PTO 70000", &mut out).unwrap();
    assert!(text(&out).contains("out of range"));

    out.clear();
    session.handle_line("", &mut out).unwrap();
    assert!(text(&out).contains("Invalid input format"));

    drop(session);
    drop(engine);
    assert!(bus.events().is_empty());
}

#[test]
fn test_mcu_bus_failure_ends_session() {
    let mut bus = MockBus::new();
    bus.fail_read_on(1, Fault::Io);
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let mut out = Vec::new();
    let err = session.handle_line("STS", &mut out).unwrap_err();
    assert!(matches!(err, RunnerError::Transaction(ref e) if e.is_bus_error()));
}

// ============================================================================
// DAC Session
// ============================================================================

#[test]
fn test_dac_write_and_read() {
    let mut bus = MockBus::new().with_responder(|_, _| vec![0x03, 0xE8]);
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = DacSession::new(&mut engine);

    let mut out = Vec::new();
    session.handle_line("w 5 1000", &mut out).unwrap();
    session.handle_line("R 5", &mut out).unwrap();
    let output = text(&out);
    assert!(output.contains("Wrote 1000 to DAC register 5"));
    assert!(output.contains("Current DAC value at register 5: 1000"));
    drop(session);
    drop(engine);
    assert_eq!(bus.writes(), vec![vec![0x28, 0x03, 0xE8], vec![0x2E]]);
}

#[test]
fn test_dac_input_errors() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = DacSession::new(&mut engine);

    let mut out = Vec::new();
    session.handle_line("W 5", &mut out).unwrap();
    assert!(text(&out).contains("Provide a register (0 to 31) and a 16-bit integer value after 'W'."));

    out.clear();
    session.handle_line("R 32", &mut out).unwrap();
    assert!(text(&out).contains("Invalid register index. Must be between 0 and 31."));

    out.clear();
    session.handle_line("R", &mut out).unwrap();
    assert!(text(&out).contains("after 'R'."));

    out.clear();
    session.handle_line("X 1", &mut out).unwrap();
    assert!(text(&out).contains("Invalid command. Type 'h' for help."));

    out.clear();
    session.handle_line("H", &mut out).unwrap();
    assert!(text(&out).contains(" W <register> <value> - Write value to a specific register (0 to 31)"));

    drop(session);
    drop(engine);
    assert!(bus.events().is_empty());
}

// ============================================================================
// Session Loop
// ============================================================================

#[test]
fn test_session_loop_until_quit() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let lines = spawn_line_reader(Cursor::new("LDR\nq\nSTS\n")).unwrap();
    let (_interrupt_tx, interrupts) = crossbeam_channel::bounded::<()>(1);
    let mut out = Vec::new();
    let end = run_session(&mut session, &lines, &interrupts, &mut out).unwrap();
    assert_eq!(end, SessionEnd::Quit);
    assert!(text(&out).starts_with("I2C Communication Program. Type 'h' for help."));
    drop(session);
    drop(engine);

    // Nothing after the quit line is executed.
    assert_eq!(bus.writes().len(), 1);
}

#[test]
fn test_session_loop_end_of_input() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = DacSession::new(&mut engine);

    let lines = spawn_line_reader(Cursor::new("R 1\n")).unwrap();
    let (_interrupt_tx, interrupts) = crossbeam_channel::bounded::<()>(1);
    let mut out = Vec::new();
    let end = run_session(&mut session, &lines, &interrupts, &mut out).unwrap();
    assert_eq!(end, SessionEnd::InputClosed);
}

#[test]
fn test_session_loop_interrupt() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    // Keep the line channel open and idle.
    let (_line_tx, lines) = crossbeam_channel::unbounded::<String>();
    let (interrupt_tx, interrupts) = crossbeam_channel::bounded(1);
    interrupt_tx.send(()).unwrap();

    let mut out = Vec::new();
    let end = run_session(&mut session, &lines, &interrupts, &mut out).unwrap();
    assert_eq!(end, SessionEnd::Interrupted);
    assert!(text(&out).contains("Cleaning up and exiting."));
}

#[test]
fn test_pending_interrupt_beats_queued_line() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    // select! picks randomly among ready channels, so repeat.
    for _ in 0..200 {
        let (line_tx, lines) = crossbeam_channel::unbounded();
        let (interrupt_tx, interrupts) = crossbeam_channel::bounded(1);
        line_tx.send("STS".to_string()).unwrap();
        interrupt_tx.send(()).unwrap();

        let mut out = Vec::new();
        let end = run_session(&mut session, &lines, &interrupts, &mut out).unwrap();
        assert_eq!(end, SessionEnd::Interrupted);
    }
    drop(session);
    drop(engine);
    assert!(bus.events().is_empty());
}

#[test]
fn test_session_loop_stops_on_bus_error() {
    let mut bus = MockBus::new();
    bus.fail_write_on(1, Fault::Short(1));
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());
    let mut session = McuSession::new(&mut engine);

    let lines = spawn_line_reader(Cursor::new("STS\nLDR\n")).unwrap();
    let (_interrupt_tx, interrupts) = crossbeam_channel::bounded::<()>(1);
    let mut out = Vec::new();
    assert!(run_session(&mut session, &lines, &interrupts, &mut out).is_err());
    drop(session);
    drop(engine);
    assert_eq!(bus.writes().len(), 1);
}

// ============================================================================
// One-shot Request
// ============================================================================

#[test]
fn test_raw_send() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());

    let request = RawRequest {
        direction: "0".to_string(),
        peripheral_type: "1".to_string(),
        index: "1".to_string(),
        value: "1500".to_string(),
    };
    let mut out = Vec::new();
    assert_eq!(request.send(&mut engine, &mut out).unwrap(), 1500);
    assert_eq!(text(&out), "1500\n");
    drop(engine);

    let events = bus.events();
    assert_eq!(events.len(), 4);
    assert_eq!(bus.writes(), vec![vec![0x01, 0x01, 0x05, 0xDC]]);
    assert!(events.contains(&BusEvent::Delay(Duration::from_millis(25))));
}

#[test]
fn test_raw_send_rejects_before_bus() {
    let mut bus = MockBus::new();
    let delay = bus.delay();
    let mut engine = TransactionEngine::with_delay(&mut bus, delay, EngineConfig::default());

    let request = RawRequest {
        direction: "1".to_string(),
        peripheral_type: "200".to_string(),
        index: "0".to_string(),
        value: "0".to_string(),
    };
    let mut out = Vec::new();
    assert!(matches!(
        request.send(&mut engine, &mut out),
        Err(RunnerError::InvalidArgument(_))
    ));
    drop(engine);
    assert!(bus.events().is_empty());
}
