//! The STM32 command table.
//!
//! Each mnemonic names one register on the STM32 together with the direction
//! the host is expected to use it in. The table is fixed at compile time and
//! kept in declaration order, which is also the order shown in help and on
//! the monitor screen.

use crate::error::{ProtocolError, ProtocolResult, ValueParseError};
use crate::frame::{pack_mcu_request, McuFrame};
use crate::types::{Direction, PeripheralType, RegisterAddress};

/// One named register command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    /// Short command name typed by the operator (exact, case-sensitive).
    pub mnemonic: &'static str,
    /// Whether the command samples or sets the register.
    pub direction: Direction,
    /// Human-readable description.
    pub label: &'static str,
    /// Display units for the register value.
    pub units: &'static str,
    kind: PeripheralType,
    index: u8,
}

impl CommandEntry {
    const fn new(
        mnemonic: &'static str,
        direction: Direction,
        kind: PeripheralType,
        index: u8,
        label: &'static str,
        units: &'static str,
    ) -> Self {
        CommandEntry {
            mnemonic,
            direction,
            label,
            units,
            kind,
            index,
        }
    }

    /// Register addressed by the command.
    pub fn target(&self) -> RegisterAddress {
        RegisterAddress::mcu_unchecked(self.kind, self.index)
    }

    /// STM32 peripheral class of the target register.
    pub fn peripheral_type(&self) -> PeripheralType {
        self.kind
    }

    /// Register index within the peripheral class.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Build the request frame. Reads always carry a zero value.
    pub fn encode(&self, value: u16) -> McuFrame {
        let value = match self.direction {
            Direction::Read => 0,
            Direction::Write => value,
        };
        pack_mcu_request(self.direction, self.kind, self.index, value)
    }

    /// Whether the monitor sweep samples this entry.
    pub fn is_readable(&self) -> bool {
        self.direction == Direction::Read
    }
}

use Direction::{Read, Write};
use PeripheralType::{AnalogChannel, FrequencyOut, Gpio, Pwm, Status};

static COMMAND_TABLE: [CommandEntry; 23] = [
    CommandEntry::new("APU", Read, Pwm, 8, "Auger Pivot Up", "%"),
    CommandEntry::new("APD", Read, Pwm, 4, "Auger Pivot Down", "%"),
    CommandEntry::new("AFU", Read, Pwm, 11, "Auger Unfold", "%"),
    CommandEntry::new("AFF", Read, Pwm, 10, "Auger Fold", "%"),
    CommandEntry::new("STU", Read, Pwm, 1, "Spout Tilt Up", "%"),
    CommandEntry::new("STD", Read, Pwm, 3, "Spout Tilt Down", "%"),
    CommandEntry::new("SRC", Read, Pwm, 6, "Spout Rotate CW", "%"),
    CommandEntry::new("SRW", Read, Pwm, 7, "Spout Rotate CCW", "%"),
    CommandEntry::new("GTO", Read, Pwm, 5, "Gate Open", "%"),
    CommandEntry::new("GTC", Read, Pwm, 9, "Gate Close", "%"),
    CommandEntry::new("PTO", Write, FrequencyOut, 1, "PTO Speed", "Hz"),
    CommandEntry::new("WFL", Write, AnalogChannel, 0, "Weight Front Left", "raw"),
    CommandEntry::new("WFR", Write, AnalogChannel, 1, "Weight Front Right", "raw"),
    CommandEntry::new("WRL", Write, AnalogChannel, 2, "Weight Rear Left", "raw"),
    CommandEntry::new("WRR", Write, AnalogChannel, 3, "Weight Rear Right", "raw"),
    CommandEntry::new("WHH", Write, AnalogChannel, 4, "Weight Hitch", "raw"),
    CommandEntry::new("TDF", Read, Pwm, 0, "Tandem Float", "I/O"),
    CommandEntry::new("TDC", Read, Pwm, 2, "Tandem Cutoff", "I/O"),
    CommandEntry::new("WSD", Write, FrequencyOut, 0, "Wheel Speed", "Hz"),
    CommandEntry::new("WDR", Write, Gpio, 2, "Wheel Direction", "I/O"),
    CommandEntry::new("LED", Write, Gpio, 1, "User Controlled LED", "I/O"),
    CommandEntry::new("LDR", Read, Gpio, 1, "Read User LED state", "NA"),
    CommandEntry::new("STS", Read, Status, 0, "STM32 Status", "NA"),
];

/// Find the entry with exactly this mnemonic.
pub fn lookup(mnemonic: &str) -> Option<&'static CommandEntry> {
    COMMAND_TABLE.iter().find(|entry| entry.mnemonic == mnemonic)
}

/// Like [`lookup`], but a missing mnemonic is a [`ProtocolError::NotFound`].
pub fn resolve(mnemonic: &str) -> ProtocolResult<&'static CommandEntry> {
    lookup(mnemonic).ok_or_else(|| {
        log::debug!("no command table entry for '{}'", mnemonic);
        ProtocolError::NotFound(mnemonic.to_string())
    })
}

/// All entries in declaration order.
pub fn list() -> impl Iterator<Item = &'static CommandEntry> + Clone {
    COMMAND_TABLE.iter()
}

/// Read-direction entries in declaration order.
pub fn readable() -> impl Iterator<Item = &'static CommandEntry> + Clone {
    COMMAND_TABLE.iter().filter(|entry| entry.is_readable())
}

/// Parse an optional base-10 value argument.
///
/// A missing or empty token means 0. Negative numbers and numbers above
/// `u16::MAX` are out of range; anything that is not an integer is malformed.
pub fn parse_value_argument(token: Option<&str>) -> Result<u16, ValueParseError> {
    let token = match token.map(str::trim) {
        None | Some("") => return Ok(0),
        Some(token) => token,
    };

    let digits = token.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValueParseError::Malformed(token.to_string()));
    }

    let out_of_range = || ValueParseError::OutOfRange {
        token: token.to_string(),
        max: u16::MAX as u32,
    };
    if token.starts_with('-') {
        // "-0" is still zero.
        if digits.bytes().all(|b| b == b'0') {
            return Ok(0);
        }
        return Err(out_of_range());
    }
    digits.parse::<u16>().map_err(|_| out_of_range())
}
