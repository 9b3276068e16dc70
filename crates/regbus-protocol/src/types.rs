//! Common types used in the protocol.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Whether a request samples a register or sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sample the register; the request value is ignored by the peer.
    Read,
    /// Set the register; the response confirms the stored value.
    Write,
}

impl Direction {
    /// The single wire bit carried in the STM32 header (`Read = 1`).
    pub fn bit(self) -> u8 {
        match self {
            Direction::Read => 1,
            Direction::Write => 0,
        }
    }

    /// Parse the wire bit. Anything other than 0 or 1 is out of range.
    pub fn from_bit(bit: u32) -> ProtocolResult<Self> {
        match bit {
            0 => Ok(Direction::Write),
            1 => Ok(Direction::Read),
            other => Err(ProtocolError::out_of_range("direction", other, 1u32)),
        }
    }

    /// Short label for tables and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Read => "read",
            Direction::Write => "write",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Peripheral classes exposed by the STM32 firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PeripheralType {
    /// Digital I/O pins (PB4, PB5, PB12).
    Gpio = 0x00,
    /// Frequency outputs (PA8, PB15).
    FrequencyOut = 0x01,
    /// PWM captured inputs (PA0-PA7, PB0-PB2, PB10).
    Pwm = 0x02,
    /// Load cell analog channels.
    AnalogChannel = 0x03,
    /// Firmware status word.
    Status = 0x04,
}

impl PeripheralType {
    /// Every peripheral class, in wire-code order.
    pub const ALL: [PeripheralType; 5] = [
        PeripheralType::Gpio,
        PeripheralType::FrequencyOut,
        PeripheralType::Pwm,
        PeripheralType::AnalogChannel,
        PeripheralType::Status,
    ];

    /// Wire code for the header's 7-bit type field.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Highest register index this class exposes.
    pub fn max_index(self) -> u8 {
        match self {
            PeripheralType::Gpio => 2,
            PeripheralType::FrequencyOut => 1,
            PeripheralType::Pwm => 11,
            PeripheralType::AnalogChannel => 11,
            PeripheralType::Status => 0,
        }
    }

    /// Short label for tables and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            PeripheralType::Gpio => "GPIO",
            PeripheralType::FrequencyOut => "FREQ",
            PeripheralType::Pwm => "PWM",
            PeripheralType::AnalogChannel => "ANALOG",
            PeripheralType::Status => "STATUS",
        }
    }
}

impl TryFrom<u8> for PeripheralType {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        PeripheralType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or(ProtocolError::UnknownPeripheralType(code))
    }
}

impl std::fmt::Display for PeripheralType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which peer owns a register, and for the STM32, which class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peripheral {
    /// A register class on the STM32.
    Mcu(PeripheralType),
    /// One of the 32 DAC registers.
    Dac,
}

impl Peripheral {
    /// Highest register index for this peripheral.
    pub fn max_index(self) -> u8 {
        match self {
            Peripheral::Mcu(kind) => kind.max_index(),
            Peripheral::Dac => DAC_REGISTER_MAX,
        }
    }

    /// Bus address of the peer that owns this peripheral.
    pub fn peer_address(self) -> u16 {
        match self {
            Peripheral::Mcu(_) => MCU_ADDRESS,
            Peripheral::Dac => DAC_ADDRESS,
        }
    }
}

/// One addressable register on one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterAddress {
    peripheral: Peripheral,
    index: u8,
}

impl RegisterAddress {
    /// Build an address, rejecting indices past the peripheral's last register.
    pub fn new(peripheral: Peripheral, index: u8) -> ProtocolResult<Self> {
        let max = peripheral.max_index();
        if index > max {
            return Err(ProtocolError::out_of_range("register index", index, max));
        }
        Ok(RegisterAddress { peripheral, index })
    }

    /// Address of a DAC register.
    pub fn dac(index: u8) -> ProtocolResult<Self> {
        Self::new(Peripheral::Dac, index)
    }

    /// Const constructor for the static command table. Bounds are checked
    /// by the table's unit tests instead.
    pub(crate) const fn mcu_unchecked(kind: PeripheralType, index: u8) -> Self {
        RegisterAddress {
            peripheral: Peripheral::Mcu(kind),
            index,
        }
    }

    /// The owning peripheral.
    pub fn peripheral(&self) -> Peripheral {
        self.peripheral
    }

    /// Register index within the peripheral.
    pub fn index(&self) -> u8 {
        self.index
    }
}

impl std::fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.peripheral {
            Peripheral::Mcu(kind) => write!(f, "{}[{}]", kind, self.index),
            Peripheral::Dac => write!(f, "DAC[{}]", self.index),
        }
    }
}

/// 2-bit control code in the DAC address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DacControl {
    /// `00`: store the following 16-bit value.
    Write = 0b00,
    /// `11`: prepare the register value for the next read.
    Read = 0b11,
}

impl DacControl {
    /// Raw 2-bit code.
    pub fn bits(self) -> u8 {
        self as u8
    }
}
