//! Metric names recorded by the engine.
//!
//! Nothing is exported unless the binary installs a `metrics` recorder.

use metrics::{describe_counter, Unit};

/// Completed or abandoned transactions, labelled `peer` and `outcome`.
pub const TRANSACTIONS_TOTAL: &str = "regbus_transactions_total";
/// Sweep rows that ended in an error.
pub const SWEEP_ERRORS_TOTAL: &str = "regbus_sweep_errors_total";
/// Completed monitor sweeps.
pub const SWEEPS_TOTAL: &str = "regbus_sweeps_total";

/// Register descriptions for every engine metric.
pub fn describe_metrics() {
    describe_counter!(
        TRANSACTIONS_TOTAL,
        Unit::Count,
        "Register transactions by peer and outcome"
    );
    describe_counter!(
        SWEEP_ERRORS_TOTAL,
        Unit::Count,
        "Monitor sweep rows that failed"
    );
    describe_counter!(SWEEPS_TOTAL, Unit::Count, "Completed monitor sweeps");
}
