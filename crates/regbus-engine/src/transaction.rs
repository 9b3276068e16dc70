//! Transaction sequencing.
//!
//! Every exchange with a peer follows the same fixed order: select the peer,
//! write the request frame, wait the settle delay, read the response frame,
//! decode. The peer firmware needs the delay to prepare its answer, so it
//! always sits strictly between the write and the read. Any bus failure
//! abandons the transaction; nothing is retried.

use std::time::Duration;

use regbus_protocol::{
    decode_dac_response, encode_dac_request, encode_mcu_request, format_frame, CommandEntry,
    DacControl, Direction, McuResponse, ProtocolError, DAC_ADDRESS, DAC_RESPONSE_SIZE, MCU_ADDRESS,
    SETTLE_DELAY,
};
use tracing::{debug, trace};

use crate::bus::{BusPort, Delay, StdDelay};
use crate::error::{BusError, TransactionError, TransactionResult};
use crate::telemetry::TRANSACTIONS_TOTAL;

/// The two peers on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peer {
    /// STM32 peripheral controller.
    Mcu,
    /// 32-register DAC.
    Dac,
}

impl Peer {
    /// Short label for logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Peer::Mcu => "mcu",
            Peer::Dac => "dac",
        }
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Nothing sent yet.
    Idle,
    /// Peer address selected.
    PeerSelected,
    /// Request frame fully written. Terminal for DAC writes, which get no
    /// response.
    Written,
    /// Settle delay elapsed.
    Settled,
    /// Response frame fully read.
    ReadComplete,
    /// Response decoded; the transaction succeeded.
    Decoded,
    /// A bus call failed and the transaction was abandoned.
    Failed,
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionState::Idle => "idle",
            TransactionState::PeerSelected => "peer selected",
            TransactionState::Written => "written",
            TransactionState::Settled => "settled",
            TransactionState::ReadComplete => "read complete",
            TransactionState::Decoded => "decoded",
            TransactionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Addresses and timing used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// STM32 bus address.
    pub mcu_address: u16,
    /// DAC bus address.
    pub dac_address: u16,
    /// Wait between writing a request and reading its response.
    pub settle_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            mcu_address: MCU_ADDRESS,
            dac_address: DAC_ADDRESS,
            settle_delay: SETTLE_DELAY,
        }
    }
}

impl EngineConfig {
    /// Bus address of `peer`.
    pub fn address(&self, peer: Peer) -> u16 {
        match peer {
            Peer::Mcu => self.mcu_address,
            Peer::Dac => self.dac_address,
        }
    }
}

/// Drives request/response exchanges over a borrowed bus.
///
/// The bus handle stays owned by the caller, so it is released on every exit
/// path regardless of how the engine is used.
pub struct TransactionEngine<'bus, B: BusPort, D: Delay = StdDelay> {
    bus: &'bus mut B,
    delay: D,
    config: EngineConfig,
    last_state: TransactionState,
}

impl<'bus, B: BusPort> TransactionEngine<'bus, B, StdDelay> {
    /// Create an engine that sleeps the calling thread for delays.
    pub fn new(bus: &'bus mut B, config: EngineConfig) -> Self {
        Self::with_delay(bus, StdDelay, config)
    }
}

impl<'bus, B: BusPort, D: Delay> TransactionEngine<'bus, B, D> {
    /// Create an engine with a custom delay source.
    pub fn with_delay(bus: &'bus mut B, delay: D, config: EngineConfig) -> Self {
        TransactionEngine {
            bus,
            delay,
            config,
            last_state: TransactionState::Idle,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Final state of the most recent transaction.
    pub fn last_state(&self) -> TransactionState {
        self.last_state
    }

    /// Block on the engine's delay source.
    pub fn pause(&mut self, duration: Duration) {
        self.delay.delay(duration);
    }

    /// Run a command table entry against the STM32 and return the register
    /// value it reports. Read entries always send a zero value.
    pub fn execute(&mut self, entry: &CommandEntry, value: u16) -> TransactionResult<u16> {
        let frame = entry.encode(value);
        debug!(
            command = entry.mnemonic,
            register = %entry.target(),
            direction = %entry.direction,
            "executing {}",
            entry.label
        );
        let response = self.exchange(Peer::Mcu, &frame, McuResponse::parse)?;
        Ok(response.value)
    }

    /// Run an STM32 request built from explicit header fields.
    pub fn execute_raw(
        &mut self,
        direction: Direction,
        peripheral_type: u8,
        index: u8,
        value: u16,
    ) -> TransactionResult<u16> {
        let frame = match encode_mcu_request(direction, peripheral_type, index, value) {
            Ok(frame) => frame,
            Err(err) => return self.reject(Peer::Mcu, err),
        };
        let response = self.exchange(Peer::Mcu, &frame, McuResponse::parse)?;
        Ok(response.value)
    }

    /// Read one DAC register: 1-byte trigger, settle, 2-byte response.
    pub fn dac_read(&mut self, index: u8) -> TransactionResult<u16> {
        let frame = match encode_dac_request(index, DacControl::Read, 0) {
            Ok(frame) => frame,
            Err(err) => return self.reject(Peer::Dac, err),
        };
        self.exchange(Peer::Dac, frame.as_bytes(), |bytes: &[u8; DAC_RESPONSE_SIZE]| {
            decode_dac_response(bytes)
        })
    }

    /// Write one DAC register. The DAC does not answer writes, so the
    /// transaction ends once the frame is on the bus.
    pub fn dac_write(&mut self, index: u8, value: u16) -> TransactionResult<()> {
        let frame = match encode_dac_request(index, DacControl::Write, value) {
            Ok(frame) => frame,
            Err(err) => return self.reject(Peer::Dac, err),
        };
        let mut state = TransactionState::Idle;
        let result = self.send(Peer::Dac, frame.as_bytes(), &mut state);
        self.finish(Peer::Dac, state, result)
    }

    /// Select, write, settle, read, decode.
    fn exchange<const N: usize, T>(
        &mut self,
        peer: Peer,
        request: &[u8],
        decode: impl FnOnce(&[u8; N]) -> T,
    ) -> TransactionResult<T> {
        let mut state = TransactionState::Idle;
        let result = self.round_trip::<N>(peer, request, &mut state).map(|response| {
            let value = decode(&response);
            state = TransactionState::Decoded;
            value
        });
        self.finish(peer, state, result)
    }

    fn round_trip<const N: usize>(
        &mut self,
        peer: Peer,
        request: &[u8],
        state: &mut TransactionState,
    ) -> TransactionResult<[u8; N]> {
        self.send(peer, request, state)?;

        self.delay.delay(self.config.settle_delay);
        *state = TransactionState::Settled;

        let mut response = [0u8; N];
        let read = self.bus.read(&mut response).map_err(|source| TransactionError::Bus {
            state: *state,
            source,
        })?;
        if read != N {
            return Err(TransactionError::Bus {
                state: *state,
                source: BusError::ShortRead {
                    expected: N,
                    actual: read,
                },
            });
        }
        *state = TransactionState::ReadComplete;
        debug!(
            %peer,
            "received {} byte(s): {} from address 0x{:02X}",
            N,
            format_frame(&response),
            self.config.address(peer)
        );
        Ok(response)
    }

    /// Select the peer and write the whole request.
    fn send(
        &mut self,
        peer: Peer,
        request: &[u8],
        state: &mut TransactionState,
    ) -> TransactionResult<()> {
        let address = self.config.address(peer);
        self.bus.select_peer(address).map_err(|source| TransactionError::Bus {
            state: *state,
            source,
        })?;
        *state = TransactionState::PeerSelected;

        let written = self.bus.write(request).map_err(|source| TransactionError::Bus {
            state: *state,
            source,
        })?;
        if written != request.len() {
            return Err(TransactionError::Bus {
                state: *state,
                source: BusError::ShortWrite {
                    expected: request.len(),
                    actual: written,
                },
            });
        }
        *state = TransactionState::Written;
        debug!(
            %peer,
            "sent {} byte(s): {} to address 0x{:02X}",
            request.len(),
            format_frame(request),
            address
        );
        Ok(())
    }

    /// Record a request that failed validation before reaching the bus.
    fn reject<T>(&mut self, peer: Peer, err: ProtocolError) -> TransactionResult<T> {
        self.finish(peer, TransactionState::Idle, Err(err.into()))
    }

    fn finish<T>(
        &mut self,
        peer: Peer,
        state: TransactionState,
        result: TransactionResult<T>,
    ) -> TransactionResult<T> {
        let outcome = match &result {
            Ok(_) => {
                self.last_state = state;
                "ok"
            }
            Err(err) => {
                self.last_state = TransactionState::Failed;
                trace!(%peer, error = %err, "transaction failed");
                if err.is_bus_error() {
                    "bus_error"
                } else {
                    "rejected"
                }
            }
        };
        metrics::counter!(TRANSACTIONS_TOTAL, "peer" => peer.as_str(), "outcome" => outcome)
            .increment(1);
        result
    }
}
