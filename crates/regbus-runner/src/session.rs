//! Line handlers for the interactive sessions.
//!
//! A handler turns one line of operator input into at most one transaction
//! and writes its answer to the session output. Input mistakes are reported
//! and the session carries on; a bus failure is returned as an error, which
//! ends the session.

use std::io::Write;

use regbus_engine::{BusPort, Delay, TransactionEngine, TransactionError};
use regbus_protocol::{
    commands, format_frame, parse_value_argument, Direction, ProtocolError, RegisterAddress,
    DAC_REGISTER_MAX, MCU_TYPE_MAX,
};
use tracing::error;

use crate::error::{RunnerError, RunnerResult};

/// What the session loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Wait for the next line.
    Continue,
    /// End the session.
    Quit,
}

/// Handles one interactive command line at a time.
pub trait LineHandler {
    /// Banner printed once when the session starts.
    fn greeting(&self) -> &'static str;

    /// Process one input line.
    fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> RunnerResult<SessionAction>;
}

/// Quit and help are shared by both sessions.
fn builtin(line: &str) -> Option<Builtin> {
    match line {
        "Q" | "q" => Some(Builtin::Quit),
        "H" | "h" => Some(Builtin::Help),
        _ => None,
    }
}

enum Builtin {
    Quit,
    Help,
}

/// Bus errors end the session; anything else is reported on `out`.
fn settle_outcome<T>(
    result: Result<T, TransactionError>,
    out: &mut dyn Write,
) -> RunnerResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TransactionError::Protocol(err)) => {
            writeln!(out, "Error: {}.", err)?;
            Ok(None)
        }
        Err(err) => {
            error!(error = %err, "transaction failed, ending session");
            Err(err.into())
        }
    }
}

// ============================================================================
// STM32 Session
// ============================================================================

/// Named-command session against the STM32.
pub struct McuSession<'e, 'bus, B: BusPort, D: Delay> {
    engine: &'e mut TransactionEngine<'bus, B, D>,
}

impl<'e, 'bus, B: BusPort, D: Delay> McuSession<'e, 'bus, B, D> {
    /// Session that runs table commands through `engine`.
    pub fn new(engine: &'e mut TransactionEngine<'bus, B, D>) -> Self {
        McuSession { engine }
    }
}

/// Print the command table as help.
pub fn write_mcu_help(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "\nAvailable commands (with optional data values):")?;
    for entry in commands::list() {
        writeln!(
            out,
            " {} <value> - {} ({}, {})",
            entry.mnemonic,
            entry.label,
            entry.direction,
            entry.target()
        )?;
    }
    writeln!(out, " H - Show this help menu")?;
    writeln!(out, " Q - Quit the program")
}

impl<B: BusPort, D: Delay> LineHandler for McuSession<'_, '_, B, D> {
    fn greeting(&self) -> &'static str {
        "I2C Communication Program. Type 'h' for help."
    }

    fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> RunnerResult<SessionAction> {
        let line = line.trim();
        match builtin(line) {
            Some(Builtin::Quit) => {
                writeln!(out, "Exiting...")?;
                return Ok(SessionAction::Quit);
            }
            Some(Builtin::Help) => {
                write_mcu_help(out)?;
                return Ok(SessionAction::Continue);
            }
            None => {}
        }

        let mut tokens = line.split_whitespace();
        let Some(mnemonic) = tokens.next() else {
            writeln!(out, "Invalid input format. Type 'h' for help.")?;
            return Ok(SessionAction::Continue);
        };
        let value = match parse_value_argument(tokens.next()) {
            Ok(value) => value,
            Err(err) => {
                writeln!(out, "Error: {}.", err)?;
                writeln!(out, "Invalid input format. Type 'h' for help.")?;
                return Ok(SessionAction::Continue);
            }
        };
        let entry = match commands::resolve(mnemonic) {
            Ok(entry) => entry,
            Err(_) => {
                writeln!(out, "Invalid command '{}'. Type 'h' for help.", mnemonic)?;
                return Ok(SessionAction::Continue);
            }
        };

        let frame = entry.encode(value);
        if let Some(reported) = settle_outcome(self.engine.execute(entry, value), out)? {
            writeln!(
                out,
                "Sent {} byte(s): {} to address: 0x{:02X}",
                frame.len(),
                format_frame(&frame),
                self.engine.config().mcu_address
            )?;
            writeln!(out, "{}: {} {}", entry.label, reported, entry.units)?;
        }
        Ok(SessionAction::Continue)
    }
}

// ============================================================================
// DAC Session
// ============================================================================

/// Register read/write session against the DAC.
pub struct DacSession<'e, 'bus, B: BusPort, D: Delay> {
    engine: &'e mut TransactionEngine<'bus, B, D>,
}

impl<'e, 'bus, B: BusPort, D: Delay> DacSession<'e, 'bus, B, D> {
    /// Session that reads and writes DAC registers through `engine`.
    pub fn new(engine: &'e mut TransactionEngine<'bus, B, D>) -> Self {
        DacSession { engine }
    }
}

/// Print the DAC command summary.
pub fn write_dac_help(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "\nAvailable commands:")?;
    writeln!(
        out,
        " W <register> <value> - Write value to a specific register (0 to {})",
        DAC_REGISTER_MAX
    )?;
    writeln!(
        out,
        " R <register> - Read current value from a specific register (0 to {})",
        DAC_REGISTER_MAX
    )?;
    writeln!(out, " H - Show this help menu")?;
    writeln!(out, " Q - Quit the program")
}

/// Parse a DAC register index token.
fn parse_register(token: Option<&str>) -> Option<u8> {
    let index = parse_value_argument(Some(token?)).ok()?;
    u8::try_from(index).ok()
}

impl<B: BusPort, D: Delay> LineHandler for DacSession<'_, '_, B, D> {
    fn greeting(&self) -> &'static str {
        "DAC I2C Communication Program. Type 'h' for help."
    }

    fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> RunnerResult<SessionAction> {
        let line = line.trim();
        match builtin(line) {
            Some(Builtin::Quit) => {
                writeln!(out, "Exiting...")?;
                return Ok(SessionAction::Quit);
            }
            Some(Builtin::Help) => {
                write_dac_help(out)?;
                return Ok(SessionAction::Continue);
            }
            None => {}
        }

        let mut chars = line.chars();
        let command = chars.next().map(|c| c.to_ascii_uppercase());
        let mut args = chars.as_str().split_whitespace();

        match command {
            Some('W') => {
                let index = parse_register(args.next());
                let value = args.next().map(|token| parse_value_argument(Some(token)));
                let (Some(index), Some(Ok(value))) = (index, value) else {
                    writeln!(
                        out,
                        "Invalid input format. Provide a register (0 to {}) and a 16-bit integer value after 'W'.",
                        DAC_REGISTER_MAX
                    )?;
                    return Ok(SessionAction::Continue);
                };
                if RegisterAddress::dac(index).is_err() {
                    writeln!(out, "Invalid register index. Must be between 0 and {}.", DAC_REGISTER_MAX)?;
                    return Ok(SessionAction::Continue);
                }
                if settle_outcome(self.engine.dac_write(index, value), out)?.is_some() {
                    writeln!(out, "Wrote {} to DAC register {}", value, index)?;
                }
            }
            Some('R') => {
                let Some(index) = parse_register(args.next()) else {
                    writeln!(
                        out,
                        "Invalid input format. Provide a register (0 to {}) after 'R'.",
                        DAC_REGISTER_MAX
                    )?;
                    return Ok(SessionAction::Continue);
                };
                if RegisterAddress::dac(index).is_err() {
                    writeln!(out, "Invalid register index. Must be between 0 and {}.", DAC_REGISTER_MAX)?;
                    return Ok(SessionAction::Continue);
                }
                if let Some(value) = settle_outcome(self.engine.dac_read(index), out)? {
                    writeln!(out, "Current DAC value at register {}: {}", index, value)?;
                }
            }
            _ => writeln!(out, "Invalid command. Type 'h' for help.")?,
        }
        Ok(SessionAction::Continue)
    }
}

// ============================================================================
// One-shot Raw Request
// ============================================================================

/// Header fields of a raw STM32 request, as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub direction: String,
    pub peripheral_type: String,
    pub index: String,
    pub value: String,
}

impl RawRequest {
    /// Validate every field before anything is sent.
    pub fn parse(&self) -> RunnerResult<(Direction, u8, u8, u16)> {
        let number = |name: &str, token: &str, max: u16| -> RunnerResult<u16> {
            let parsed = parse_value_argument(Some(token))
                .map_err(|err| RunnerError::InvalidArgument(format!("{}: {}", name, err)))?;
            if parsed > max {
                return Err(RunnerError::InvalidArgument(format!(
                    "{}: {} is out of range (0 to {})",
                    name, parsed, max
                )));
            }
            Ok(parsed)
        };

        let direction = Direction::from_bit(u32::from(number("direction", &self.direction, 1)?))
            .map_err(|err: ProtocolError| RunnerError::InvalidArgument(err.to_string()))?;
        let peripheral_type = number("peripheral type", &self.peripheral_type, u16::from(MCU_TYPE_MAX))?;
        let index = number("index", &self.index, u16::from(u8::MAX))?;
        let value = number("value", &self.value, u16::MAX)?;
        // Bounds were checked above.
        Ok((direction, peripheral_type as u8, index as u8, value))
    }

    /// Send the request and print the reported value.
    pub fn send<B: BusPort, D: Delay>(
        &self,
        engine: &mut TransactionEngine<'_, B, D>,
        out: &mut dyn Write,
    ) -> RunnerResult<u16> {
        let (direction, peripheral_type, index, value) = self.parse()?;
        let reported = engine.execute_raw(direction, peripheral_type, index, value)?;
        writeln!(out, "{}", reported)?;
        Ok(reported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(direction: &str, kind: &str, index: &str, value: &str) -> RawRequest {
        RawRequest {
            direction: direction.to_string(),
            peripheral_type: kind.to_string(),
            index: index.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_raw_request_parse() {
        assert_eq!(
            raw("1", "2", "8", "0").parse().unwrap(),
            (Direction::Read, 2, 8, 0)
        );
        assert_eq!(
            raw("0", "127", "255", "65535").parse().unwrap(),
            (Direction::Write, 127, 255, 65535)
        );
    }

    #[test]
    fn test_raw_request_rejects_out_of_range() {
        assert!(raw("2", "0", "0", "0").parse().is_err());
        assert!(raw("1", "128", "0", "0").parse().is_err());
        assert!(raw("1", "0", "256", "0").parse().is_err());
        assert!(raw("1", "0", "0", "65536").parse().is_err());
        assert!(raw("1", "x", "0", "0").parse().is_err());
    }

    #[test]
    fn test_parse_register() {
        assert_eq!(parse_register(Some("31")), Some(31));
        assert_eq!(parse_register(Some("300")), None);
        assert_eq!(parse_register(Some("r")), None);
        assert_eq!(parse_register(None), None);
    }
}
