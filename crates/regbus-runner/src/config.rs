//! Runner configuration.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags. Every field has a default, so an empty file (or no
//! file) yields the stock hardware setup:
//!
//! ```yaml
//! device: /dev/i2c-1
//! mcu_address: 0x10
//! dac_address: 0x60
//! settle_ms: 25
//! refresh_ms: 1000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regbus_engine::EngineConfig;
use regbus_protocol::{DAC_ADDRESS, MCU_ADDRESS, REFRESH_PERIOD, SETTLE_DELAY};
use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// Largest 7-bit bus address.
pub const MAX_PEER_ADDRESS: u16 = 0x7F;

/// Default bus device node.
pub const DEFAULT_DEVICE: &str = "/dev/i2c-1";

/// Runner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// I2C bus device node.
    pub device: PathBuf,
    /// STM32 bus address.
    pub mcu_address: u16,
    /// DAC bus address.
    pub dac_address: u16,
    /// Settle delay between request and response, in milliseconds.
    pub settle_ms: u64,
    /// Monitor sweep period, in milliseconds.
    pub refresh_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            device: PathBuf::from(DEFAULT_DEVICE),
            mcu_address: MCU_ADDRESS,
            dac_address: DAC_ADDRESS,
            settle_ms: SETTLE_DELAY.as_millis() as u64,
            refresh_ms: REFRESH_PERIOD.as_millis() as u64,
        }
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub device: Option<PathBuf>,
    pub mcu_address: Option<u16>,
    pub dac_address: Option<u16>,
    pub settle_ms: Option<u64>,
    pub refresh_ms: Option<u64>,
}

impl RunnerConfig {
    /// Load settings from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RunnerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunnerConfig =
            serde_yaml::from_str(&text).map_err(|source| RunnerError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise start from defaults, then apply
    /// `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> RunnerResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Replace every field that has an override.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(device) = &overrides.device {
            self.device = device.clone();
        }
        if let Some(address) = overrides.mcu_address {
            self.mcu_address = address;
        }
        if let Some(address) = overrides.dac_address {
            self.dac_address = address;
        }
        if let Some(ms) = overrides.settle_ms {
            self.settle_ms = ms;
        }
        if let Some(ms) = overrides.refresh_ms {
            self.refresh_ms = ms;
        }
    }

    /// Check that both peer addresses are 7-bit and distinct.
    pub fn validate(&self) -> RunnerResult<()> {
        for (name, address) in [("mcu_address", self.mcu_address), ("dac_address", self.dac_address)] {
            if address > MAX_PEER_ADDRESS {
                return Err(RunnerError::Config(format!(
                    "{} 0x{:02X} is not a 7-bit address",
                    name, address
                )));
            }
        }
        if self.mcu_address == self.dac_address {
            return Err(RunnerError::Config(format!(
                "mcu_address and dac_address are both 0x{:02X}",
                self.mcu_address
            )));
        }
        Ok(())
    }

    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            mcu_address: self.mcu_address,
            dac_address: self.dac_address,
            settle_delay: Duration::from_millis(self.settle_ms),
        }
    }

    /// Monitor sweep period.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

/// Parse a bus address given as decimal or `0x`-prefixed hex.
pub fn parse_address(text: &str) -> Result<u16, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    match parsed {
        Ok(address) if address <= MAX_PEER_ADDRESS => Ok(address),
        Ok(address) => Err(format!("0x{:02X} is not a 7-bit address", address)),
        Err(_) => Err(format!("invalid address '{}'", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hardware() {
        let config = RunnerConfig::default();
        assert_eq!(config.device, PathBuf::from("/dev/i2c-1"));
        assert_eq!(config.engine_config(), EngineConfig::default());
        assert_eq!(config.refresh_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: RunnerConfig = serde_yaml::from_str("settle_ms: 40\n").unwrap();
        assert_eq!(config.settle_ms, 40);
        assert_eq!(config.mcu_address, 0x10);
        assert_eq!(config.refresh_ms, 1000);
    }

    #[test]
    fn test_overrides_win() {
        let mut config = RunnerConfig::default();
        config.apply(&ConfigOverrides {
            dac_address: Some(0x61),
            refresh_ms: Some(250),
            ..Default::default()
        });
        assert_eq!(config.dac_address, 0x61);
        assert_eq!(config.refresh_ms, 250);
        assert_eq!(config.mcu_address, 0x10);
    }

    #[test]
    fn test_validate_rejects_bad_addresses() {
        let config = RunnerConfig {
            mcu_address: 0x80,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RunnerError::Config(_))));

        let config = RunnerConfig {
            dac_address: 0x10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x10"), Ok(0x10));
        assert_eq!(parse_address("96"), Ok(0x60));
        assert!(parse_address("0x80").is_err());
        assert!(parse_address("bus").is_err());
    }
}
