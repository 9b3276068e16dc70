//! Frame encoding/decoding.
//!
//! Both peers use fixed-size frames with big-endian 16-bit values.
//!
//! STM32 request and response (4 bytes):
//!
//! ```text
//! +---+---------------+---------+----------+----------+
//! | D | type (7 bits) |  index  | value_hi | value_lo |
//! +---+---------------+---------+----------+----------+
//! ```
//!
//! `D` is the direction bit (1 = read). In the response the first two bytes
//! are echo/status owned by the firmware and only the value is interpreted.
//!
//! DAC address byte, followed by the value on writes:
//!
//! ```text
//! +----------------------+--------------+---+
//! | register (bits 7..3) | ctrl (2..1)  | 0 |
//! +----------------------+--------------+---+
//! ```
//!
//! A DAC read is a one-byte trigger; the 2-byte response carries no header.

use bytes::BufMut;

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{DacControl, Direction, PeripheralType};

/// A 4-byte STM32 request frame.
pub type McuFrame = [u8; MCU_REQUEST_SIZE];

/// Encode an STM32 request.
///
/// `peripheral_type` is the raw 7-bit field; any code up to 127 is accepted
/// here, the command table only ever emits the defined classes. The register
/// index is passed through untouched.
pub fn encode_mcu_request(
    direction: Direction,
    peripheral_type: u8,
    index: u8,
    value: u16,
) -> ProtocolResult<McuFrame> {
    if peripheral_type > MCU_TYPE_MAX {
        return Err(ProtocolError::out_of_range(
            "peripheral type",
            peripheral_type,
            MCU_TYPE_MAX,
        ));
    }

    Ok(pack_header(direction, peripheral_type, index, value))
}

/// Encode a request for a known peripheral class. Cannot fail.
pub(crate) fn pack_mcu_request(
    direction: Direction,
    kind: PeripheralType,
    index: u8,
    value: u16,
) -> McuFrame {
    pack_header(direction, kind.code(), index, value)
}

fn pack_header(direction: Direction, peripheral_type: u8, index: u8, value: u16) -> McuFrame {
    let mut frame = [0u8; MCU_REQUEST_SIZE];
    frame[0] = (direction.bit() << MCU_DIRECTION_SHIFT) | (peripheral_type & MCU_TYPE_MASK);
    frame[1] = index;
    (&mut frame[2..]).put_u16(value);
    frame
}

/// A decoded STM32 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McuResponse {
    /// Firmware echo/status bytes, not interpreted.
    pub echo: [u8; 2],
    /// Register value.
    pub value: u16,
}

impl McuResponse {
    /// Split a response frame into echo and value.
    pub fn parse(frame: &[u8; MCU_RESPONSE_SIZE]) -> Self {
        McuResponse {
            echo: [frame[0], frame[1]],
            value: u16::from_be_bytes([frame[2], frame[3]]),
        }
    }
}

/// Decode the register value from an STM32 response.
pub fn decode_mcu_response(frame: &[u8; MCU_RESPONSE_SIZE]) -> u16 {
    McuResponse::parse(frame).value
}

/// An encoded DAC request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DacRequestFrame {
    /// Address byte plus 16-bit value.
    Write([u8; DAC_WRITE_SIZE]),
    /// Address byte alone; the DAC answers on the next read.
    ReadTrigger([u8; DAC_READ_TRIGGER_SIZE]),
}

impl DacRequestFrame {
    /// Bytes to put on the bus.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DacRequestFrame::Write(bytes) => bytes,
            DacRequestFrame::ReadTrigger(bytes) => bytes,
        }
    }

    /// Number of bytes the DAC sends back for this request.
    pub fn response_len(&self) -> usize {
        match self {
            DacRequestFrame::Write(_) => 0,
            DacRequestFrame::ReadTrigger(_) => DAC_RESPONSE_SIZE,
        }
    }
}

/// Pack the DAC address byte.
pub fn dac_address_byte(register_index: u8, control: DacControl) -> ProtocolResult<u8> {
    if register_index > DAC_REGISTER_MAX {
        return Err(ProtocolError::out_of_range(
            "DAC register",
            register_index,
            DAC_REGISTER_MAX,
        ));
    }
    Ok(((register_index & DAC_INDEX_MASK) << DAC_INDEX_SHIFT)
        | ((control.bits() & DAC_CONTROL_MASK) << DAC_CONTROL_SHIFT))
}

/// Encode a DAC request.
///
/// Writes produce a 3-byte frame; reads produce the 1-byte trigger and
/// ignore `value`.
pub fn encode_dac_request(
    register_index: u8,
    control: DacControl,
    value: u16,
) -> ProtocolResult<DacRequestFrame> {
    let address = dac_address_byte(register_index, control)?;
    Ok(match control {
        DacControl::Write => {
            let mut frame = [0u8; DAC_WRITE_SIZE];
            frame[0] = address;
            (&mut frame[1..]).put_u16(value);
            DacRequestFrame::Write(frame)
        }
        DacControl::Read => DacRequestFrame::ReadTrigger([address]),
    })
}

/// Decode a DAC response.
pub fn decode_dac_response(frame: &[u8; DAC_RESPONSE_SIZE]) -> u16 {
    u16::from_be_bytes(*frame)
}

/// Render bytes as space-separated upper-case hex (`"82 08 00 00"`).
pub fn format_frame(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
