//! STM32 / DAC Register Protocol
//!
//! This crate provides the frame codec and command table for the register
//! protocol spoken over I2C to two peers: an STM32 peripheral controller and
//! a 32-register DAC.
//!
//! # Protocol Overview
//!
//! Every exchange is a fixed-size request written by the host, a short settle
//! delay, and a fixed-size response read back:
//!
//! - **STM32** (address `0x10`): 4-byte request (direction bit, 7-bit
//!   peripheral type, register index, 16-bit value) and 4-byte response whose
//!   last two bytes carry the register value.
//! - **DAC** (address `0x60`): 3-byte write frame, or a 1-byte read trigger
//!   followed by a 2-byte response.
//!
//! All 16-bit values are big-endian. Nothing in this crate performs I/O.
//!
//! # Example
//!
//! ```rust
//! use regbus_protocol::{commands, decode_mcu_response};
//!
//! let entry = commands::lookup("APU").expect("APU is in the table");
//! assert_eq!(entry.encode(0), [0x82, 0x08, 0x00, 0x00]);
//! assert_eq!(decode_mcu_response(&[0x82, 0x08, 0x00, 0x2A]), 42);
//! ```

pub mod commands;
mod constants;
mod error;
mod frame;
mod types;

pub use commands::{parse_value_argument, CommandEntry};
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use types::*;
