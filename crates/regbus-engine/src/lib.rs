//! Register transactions over I2C.
//!
//! This crate drives the register protocol from `regbus-protocol` across a
//! two-wire bus. The bus itself is a capability ([`BusPort`]) handed to the
//! [`TransactionEngine`] by reference; a Linux implementation is provided by
//! [`LinuxI2cBus`] and a recording in-memory one by [`mock::MockBus`].
//!
//! # Example
//!
//! ```rust,ignore
//! use regbus_engine::{EngineConfig, LinuxI2cBus, TransactionEngine};
//! use regbus_protocol::commands;
//!
//! let mut bus = LinuxI2cBus::open("/dev/i2c-1")?;
//! let mut engine = TransactionEngine::new(&mut bus, EngineConfig::default());
//! let status = engine.execute(commands::lookup("STS").unwrap(), 0)?;
//! ```

mod bus;
mod error;
#[cfg(target_os = "linux")]
mod i2c;
pub mod telemetry;
pub mod mock;
mod shutdown;
mod sweep;
mod transaction;

pub use bus::*;
pub use error::*;
#[cfg(target_os = "linux")]
pub use i2c::*;
pub use shutdown::*;
pub use sweep::*;
pub use transaction::*;
