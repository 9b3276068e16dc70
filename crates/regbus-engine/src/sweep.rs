//! Periodic polling of every readable register.
//!
//! A sweep walks the readable command table entries in declaration order and
//! runs one full transaction per entry. A failing entry is reported on its
//! own row and the sweep moves on; this is the only place a bus error does
//! not end the session. Each entry is given an equal share of the refresh
//! period so that a whole sweep fits inside it.

use std::time::{Duration, Instant};

use regbus_protocol::{commands, CommandEntry, REFRESH_PERIOD};
use tracing::{debug, warn};

use crate::bus::{BusPort, Delay};
use crate::error::TransactionResult;
use crate::shutdown::ShutdownSignal;
use crate::telemetry::{SWEEPS_TOTAL, SWEEP_ERRORS_TOTAL};
use crate::transaction::TransactionEngine;

/// Result of polling one entry.
#[derive(Debug)]
pub struct SweepRow {
    /// Position of the entry within the sweep.
    pub position: usize,
    /// The entry polled.
    pub entry: &'static CommandEntry,
    /// Register value, or why it could not be read.
    pub outcome: TransactionResult<u16>,
}

/// Totals for one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepSummary {
    /// Entries a transaction was attempted for.
    pub attempted: usize,
    /// Entries whose transaction failed.
    pub failed: usize,
    /// Whether every entry was attempted (false if shutdown interrupted it).
    pub completed: bool,
}

/// Sweeps a fixed list of entries at a fixed refresh period.
#[derive(Debug, Clone)]
pub struct Poller {
    entries: Vec<&'static CommandEntry>,
    refresh_period: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(REFRESH_PERIOD)
    }
}

impl Poller {
    /// Poll every readable command table entry.
    pub fn new(refresh_period: Duration) -> Self {
        Self::with_entries(commands::readable().collect(), refresh_period)
    }

    /// Poll an explicit list of entries.
    pub fn with_entries(entries: Vec<&'static CommandEntry>, refresh_period: Duration) -> Self {
        Poller {
            entries,
            refresh_period,
        }
    }

    /// Entries polled each sweep.
    pub fn entries(&self) -> &[&'static CommandEntry] {
        &self.entries
    }

    /// Target length of one sweep.
    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    /// Time allotted to each entry.
    pub fn per_entry_budget(&self) -> Duration {
        match u32::try_from(self.entries.len()) {
            Ok(0) | Err(_) => self.refresh_period,
            Ok(n) => self.refresh_period / n,
        }
    }

    /// Run one sweep, handing each row to `on_row` as soon as it is known.
    ///
    /// `shutdown` is checked before every entry.
    pub fn sweep<B: BusPort, D: Delay>(
        &self,
        engine: &mut TransactionEngine<'_, B, D>,
        shutdown: &ShutdownSignal,
        mut on_row: impl FnMut(&SweepRow),
    ) -> SweepSummary {
        let budget = self.per_entry_budget();
        let mut summary = SweepSummary::default();

        if self.entries.is_empty() {
            if shutdown.is_raised() {
                return summary;
            }
            // Nothing to poll; still take a whole period so `run` cannot spin.
            engine.pause(self.refresh_period);
        }

        for (position, entry) in self.entries.iter().copied().enumerate() {
            if shutdown.is_raised() {
                debug!(position, "sweep interrupted by shutdown");
                return summary;
            }

            let started = Instant::now();
            let outcome = engine.execute(entry, 0);
            summary.attempted += 1;
            if let Err(err) = &outcome {
                summary.failed += 1;
                warn!(command = entry.mnemonic, error = %err, "{} read failed", entry.label);
                metrics::counter!(SWEEP_ERRORS_TOTAL, "command" => entry.mnemonic).increment(1);
            }

            on_row(&SweepRow {
                position,
                entry,
                outcome,
            });

            engine.pause(budget.saturating_sub(started.elapsed()));
        }

        summary.completed = true;
        metrics::counter!(SWEEPS_TOTAL).increment(1);
        summary
    }

    /// Sweep repeatedly until `shutdown` is raised.
    ///
    /// Returns the number of sweeps that ran to completion.
    pub fn run<B: BusPort, D: Delay>(
        &self,
        engine: &mut TransactionEngine<'_, B, D>,
        shutdown: &ShutdownSignal,
        mut on_event: impl FnMut(SweepEvent<'_>),
    ) -> u64 {
        let mut completed = 0;
        while !shutdown.is_raised() {
            on_event(SweepEvent::Started(completed));
            let summary = self.sweep(engine, shutdown, |row| on_event(SweepEvent::Row(row)));
            if summary.completed {
                completed += 1;
            }
            debug!(
                sweep = completed,
                attempted = summary.attempted,
                failed = summary.failed,
                "sweep finished"
            );
            on_event(SweepEvent::Finished(summary));
        }
        completed
    }
}

/// Progress reported by [`Poller::run`].
#[derive(Debug)]
pub enum SweepEvent<'a> {
    /// A sweep is about to start; carries the number of completed sweeps.
    Started(u64),
    /// One entry was polled.
    Row(&'a SweepRow),
    /// A sweep ended, completed or interrupted.
    Finished(SweepSummary),
}
