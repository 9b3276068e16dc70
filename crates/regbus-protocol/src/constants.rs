//! Protocol constants
//!
//! Bus addresses, frame sizes, and wire codes shared by the STM32 register
//! protocol and the DAC register protocol.

use std::time::Duration;

// ============================================================================
// Peer Addresses
// ============================================================================

/// 7-bit I2C address of the STM32 peripheral controller.
pub const MCU_ADDRESS: u16 = 0x10;
/// 7-bit I2C address of the DAC.
pub const DAC_ADDRESS: u16 = 0x60;

// ============================================================================
// Frame Sizes
// ============================================================================

/// STM32 request frame: header, index, value high, value low.
pub const MCU_REQUEST_SIZE: usize = 4;
/// STM32 response frame: echo/status (2 bytes), value high, value low.
pub const MCU_RESPONSE_SIZE: usize = 4;
/// DAC write frame: address byte, value high, value low.
pub const DAC_WRITE_SIZE: usize = 3;
/// DAC read trigger: address byte only.
pub const DAC_READ_TRIGGER_SIZE: usize = 1;
/// DAC response frame: value high, value low.
pub const DAC_RESPONSE_SIZE: usize = 2;

// ============================================================================
// Header Bit Layout
// ============================================================================

/// Bit position of the direction flag in the STM32 header byte.
pub const MCU_DIRECTION_SHIFT: u8 = 7;
/// Mask of the 7-bit peripheral type field in the STM32 header byte.
pub const MCU_TYPE_MASK: u8 = 0x7F;
/// Largest peripheral type code that fits the header.
pub const MCU_TYPE_MAX: u8 = 0x7F;

/// Bit position of the register index in the DAC address byte.
pub const DAC_INDEX_SHIFT: u8 = 3;
/// Mask of the 5-bit DAC register index (before shifting).
pub const DAC_INDEX_MASK: u8 = 0x1F;
/// Bit position of the 2-bit control code in the DAC address byte.
pub const DAC_CONTROL_SHIFT: u8 = 1;
/// Mask of the 2-bit control code (before shifting).
pub const DAC_CONTROL_MASK: u8 = 0x03;
/// Highest addressable DAC register.
pub const DAC_REGISTER_MAX: u8 = 31;

// ============================================================================
// Timing
// ============================================================================

/// Time the peer firmware needs between a request and its response.
pub const SETTLE_DELAY: Duration = Duration::from_millis(25);
/// Target period of one monitor sweep over the readable registers.
pub const REFRESH_PERIOD: Duration = Duration::from_secs(1);
