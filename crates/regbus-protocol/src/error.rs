//! Protocol error types.

use thiserror::Error;

/// Errors raised before any bytes reach the bus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A field does not fit its valid range.
    #[error("{what} {value} out of range (max {max})")]
    OutOfRange {
        /// Name of the offending field.
        what: &'static str,
        /// Value supplied.
        value: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// No command table entry has this mnemonic.
    #[error("unknown command '{0}'")]
    NotFound(String),

    /// A numeric argument could not be used.
    #[error(transparent)]
    InvalidValue(#[from] ValueParseError),

    /// Peripheral type code has no table meaning.
    #[error("unknown peripheral type: 0x{0:02X}")]
    UnknownPeripheralType(u8),
}

/// Reasons a numeric command argument is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueParseError {
    /// Token is not a base-10 integer.
    #[error("invalid number '{0}'")]
    Malformed(String),

    /// Token is an integer but not in the accepted range.
    #[error("value '{token}' is out of range (0 to {max})")]
    OutOfRange {
        /// Token as typed.
        token: String,
        /// Largest accepted value.
        max: u32,
    },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl ProtocolError {
    pub(crate) fn out_of_range(what: &'static str, value: impl Into<u32>, max: impl Into<u32>) -> Self {
        ProtocolError::OutOfRange {
            what,
            value: value.into(),
            max: max.into(),
        }
    }
}
