//! Terminal plumbing: stdin reader thread, Ctrl+C wiring, session loop.
//!
//! The bus stays on the main thread. Input lines arrive from a reader thread
//! over a channel, and Ctrl+C arrives over a second channel, so the session
//! loop can wait on both at once and only ever stops between transactions.

use std::io::{BufRead, Write};
use std::thread;

use crossbeam_channel::{select, Receiver};
use regbus_engine::ShutdownSignal;
use tracing::{debug, info};

use crate::error::RunnerResult;
use crate::session::{LineHandler, SessionAction};

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The operator typed the quit command.
    Quit,
    /// Ctrl+C was pressed.
    Interrupted,
    /// Standard input reached end of file.
    InputClosed,
}

/// Read lines from `reader` on a background thread.
///
/// The channel disconnects when the reader hits end of file or an error.
pub fn spawn_line_reader<R>(reader: R) -> RunnerResult<Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("input reader finished");
        })?;
    Ok(rx)
}

/// Exit status used when a second Ctrl+C terminates the process.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Raise `shutdown` and notify the returned channel on Ctrl+C.
///
/// A second Ctrl+C terminates the process, which is the only way to abandon
/// a transfer that is blocked on the bus.
pub fn install_interrupt_handler(shutdown: ShutdownSignal) -> RunnerResult<Receiver<()>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        if shutdown.is_raised() {
            std::process::exit(FORCED_EXIT_CODE);
        }
        shutdown.raise();
        let _ = tx.try_send(());
    })?;
    Ok(rx)
}

/// Whether an interrupt is already waiting on `interrupts`.
fn interrupt_pending(interrupts: &Receiver<()>) -> bool {
    interrupts.try_recv().is_ok()
}

/// Drive `handler` with input lines until quit, interrupt or end of input.
pub fn run_session(
    handler: &mut dyn LineHandler,
    lines: &Receiver<String>,
    interrupts: &Receiver<()>,
    out: &mut dyn Write,
) -> RunnerResult<SessionEnd> {
    writeln!(out, "{}", handler.greeting())?;
    loop {
        write!(out, "\nEnter a command: ")?;
        out.flush()?;

        select! {
            recv(lines) -> line => match line {
                Ok(line) => {
                    // Both channels may be ready at once; Ctrl+C wins.
                    if interrupt_pending(interrupts) {
                        return interrupted(out);
                    }
                    if handler.handle_line(&line, out)? == SessionAction::Quit {
                        return Ok(SessionEnd::Quit);
                    }
                }
                Err(_) => {
                    writeln!(out)?;
                    info!("input closed, ending session");
                    return Ok(SessionEnd::InputClosed);
                }
            },
            recv(interrupts) -> _ => return interrupted(out),
        }
    }
}

fn interrupted(out: &mut dyn Write) -> RunnerResult<SessionEnd> {
    writeln!(out, "\nCaught interrupt. Cleaning up and exiting.")?;
    Ok(SessionEnd::Interrupted)
}
