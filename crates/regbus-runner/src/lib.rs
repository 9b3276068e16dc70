//! Front end for the regbus register protocol.
//!
//! Provides the pieces behind the `regbus` binary: configuration loading,
//! the interactive STM32 and DAC sessions, the monitor screen, and the
//! terminal plumbing that ties them to stdin and Ctrl+C.

pub mod config;
pub mod console;
pub mod error;
pub mod monitor;
pub mod session;

pub use config::{ConfigOverrides, RunnerConfig};
pub use error::{RunnerError, RunnerResult};
