//! Full-screen status monitor.
//!
//! Each sweep redraws the table in place: the cursor is sent home, the header
//! and one row per readable register are written over the previous frame,
//! and anything left below is cleared.

use std::io::{self, Write};

use regbus_engine::{BusPort, Delay, Poller, ShutdownSignal, SweepEvent, SweepRow, TransactionEngine};

use crate::error::RunnerResult;

/// Move the cursor to the top-left corner.
pub const CURSOR_HOME: &str = "\x1b[H";
/// Clear from the cursor to the end of the screen.
pub const CLEAR_TO_END: &str = "\x1b[J";

const RULE: &str = "------------------------------------------------------";

/// Home the cursor and write the column header.
pub fn write_header(out: &mut dyn Write) -> io::Result<()> {
    write!(out, "{}", CURSOR_HOME)?;
    writeln!(out, "{:<25} {:<10} {:<10}", "Description", "Value", "Units")?;
    writeln!(out, "{}", RULE)
}

/// One table row; a failed entry shows `ERROR` in the value column.
pub fn write_row(out: &mut dyn Write, row: &SweepRow) -> io::Result<()> {
    let entry = row.entry;
    match &row.outcome {
        Ok(value) => writeln!(out, "{:<25} {:<10} {:<10}", entry.label, value, entry.units),
        Err(_) => writeln!(out, "{:<25} {:<10} {:<10}", entry.label, "ERROR", entry.units),
    }
}

/// Poll and redraw until `shutdown` is raised. Returns completed sweeps.
pub fn run_monitor<B: BusPort, D: Delay>(
    poller: &Poller,
    engine: &mut TransactionEngine<'_, B, D>,
    shutdown: &ShutdownSignal,
    out: &mut dyn Write,
) -> RunnerResult<u64> {
    let mut failure: Option<io::Error> = None;
    let sweeps = poller.run(engine, shutdown, |event| {
        if failure.is_some() {
            return;
        }
        let written = match event {
            SweepEvent::Started(_) => write_header(out),
            SweepEvent::Row(row) => write_row(out, row),
            SweepEvent::Finished(_) => write!(out, "{}", CLEAR_TO_END).and_then(|()| out.flush()),
        };
        if let Err(err) = written {
            // The terminal is gone; stop sweeping.
            shutdown.raise();
            failure = Some(err);
        }
    });

    if let Some(err) = failure {
        return Err(err.into());
    }
    if shutdown.is_raised() {
        writeln!(out, "\nCaught interrupt. Cleaning up and exiting.")?;
    }
    Ok(sweeps)
}
