//! Error types for bus access and transactions.

use std::io;

use regbus_protocol::ProtocolError;
use thiserror::Error;

use crate::transaction::TransactionState;

/// Failures of the underlying two-wire bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus device node could not be opened.
    #[error("failed to open I2C bus {path}: {source}")]
    Open {
        /// Device node path.
        path: String,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The peer address could not be selected.
    #[error("failed to select peer 0x{address:02X}: {source}")]
    SelectPeer {
        /// 7-bit peer address.
        address: u16,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A write or read call failed outright.
    #[error("I2C {op} failed: {source}")]
    Io {
        /// `"write"` or `"read"`.
        op: &'static str,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Fewer bytes were written than the frame holds.
    #[error("short write: sent {actual} of {expected} bytes")]
    ShortWrite {
        /// Frame length.
        expected: usize,
        /// Bytes accepted by the bus.
        actual: usize,
    },

    /// Fewer bytes were read than the response frame holds.
    #[error("short read: received {actual} of {expected} bytes")]
    ShortRead {
        /// Frame length.
        expected: usize,
        /// Bytes delivered by the bus.
        actual: usize,
    },
}

/// Failure of one logical request/response exchange.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The request was rejected before touching the bus.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A bus call failed; `state` is the last state the transaction reached.
    #[error("{source} (transaction abandoned after {state})")]
    Bus {
        /// Last state reached before the failing call.
        state: TransactionState,
        /// The bus failure.
        source: BusError,
    },
}

impl TransactionError {
    /// Whether this error came from the bus rather than from validation.
    pub fn is_bus_error(&self) -> bool {
        matches!(self, TransactionError::Bus { .. })
    }
}

/// Result type alias for bus calls.
pub type BusResult<T> = Result<T, BusError>;

/// Result type alias for transactions.
pub type TransactionResult<T> = Result<T, TransactionError>;
