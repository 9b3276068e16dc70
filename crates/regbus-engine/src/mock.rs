//! In-memory bus for tests.
//!
//! [`MockBus`] records every bus call and every delay into one shared event
//! log, so tests can assert on the exact ordering of select, write, delay and
//! read. Responses come from a responder closure; by default the bus echoes
//! the last written frame back, padded or truncated to the read length.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::bus::{BusPort, Delay};
use crate::error::{BusError, BusResult};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// `select_peer(address)`.
    Select(u16),
    /// `write(bytes)`.
    Write(Vec<u8>),
    /// A delay of the given length.
    Delay(Duration),
    /// `read` of a buffer of the given length.
    Read(usize),
}

/// Shared, ordered event log.
pub type EventLog = Arc<Mutex<Vec<BusEvent>>>;

/// Injected misbehaviour for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The call fails with an I/O error.
    Io,
    /// The call moves only this many bytes.
    Short(usize),
}

type Responder = Box<dyn FnMut(u16, &[u8]) -> Vec<u8> + Send>;

/// Recording bus with scripted responses and fault injection.
pub struct MockBus {
    events: EventLog,
    selected: Option<u16>,
    last_write: Vec<u8>,
    responder: Responder,
    select_faults: HashMap<usize, Fault>,
    write_faults: HashMap<usize, Fault>,
    read_faults: HashMap<usize, Fault>,
    selects: usize,
    writes: usize,
    reads: usize,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// A bus that echoes each request back.
    pub fn new() -> Self {
        MockBus {
            events: Arc::new(Mutex::new(Vec::new())),
            selected: None,
            last_write: Vec::new(),
            responder: Box::new(|_, request| request.to_vec()),
            select_faults: HashMap::new(),
            write_faults: HashMap::new(),
            read_faults: HashMap::new(),
            selects: 0,
            writes: 0,
            reads: 0,
        }
    }

    /// Answer reads with `responder(selected_address, last_written_frame)`.
    pub fn with_responder(
        mut self,
        responder: impl FnMut(u16, &[u8]) -> Vec<u8> + Send + 'static,
    ) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// Inject `fault` into the `n`th select call (1-based).
    pub fn fail_select_on(&mut self, n: usize, fault: Fault) {
        self.select_faults.insert(n, fault);
    }

    /// Inject `fault` into the `n`th write call (1-based).
    pub fn fail_write_on(&mut self, n: usize, fault: Fault) {
        self.write_faults.insert(n, fault);
    }

    /// Inject `fault` into the `n`th read call (1-based).
    pub fn fail_read_on(&mut self, n: usize, fault: Fault) {
        self.read_faults.insert(n, fault);
    }

    /// A delay source that records into this bus's event log.
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            events: Arc::clone(&self.events),
        }
    }

    /// Snapshot of every recorded event.
    pub fn events(&self) -> Vec<BusEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Every frame written so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BusEvent::Write(bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    /// Address currently selected.
    pub fn selected(&self) -> Option<u16> {
        self.selected
    }

    fn record(&self, event: BusEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

fn injected_io_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "injected fault")
}

impl BusPort for MockBus {
    fn select_peer(&mut self, address: u16) -> BusResult<()> {
        self.selects += 1;
        self.record(BusEvent::Select(address));
        if self.select_faults.contains_key(&self.selects) {
            return Err(BusError::SelectPeer {
                address,
                source: injected_io_error(),
            });
        }
        self.selected = Some(address);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> BusResult<usize> {
        self.writes += 1;
        self.record(BusEvent::Write(bytes.to_vec()));
        match self.write_faults.get(&self.writes) {
            Some(Fault::Io) => Err(BusError::Io {
                op: "write",
                source: injected_io_error(),
            }),
            Some(Fault::Short(n)) => Ok((*n).min(bytes.len())),
            None => {
                self.last_write = bytes.to_vec();
                Ok(bytes.len())
            }
        }
    }

    fn read(&mut self, buffer: &mut [u8]) -> BusResult<usize> {
        self.reads += 1;
        self.record(BusEvent::Read(buffer.len()));
        if let Some(Fault::Io) = self.read_faults.get(&self.reads) {
            return Err(BusError::Io {
                op: "read",
                source: injected_io_error(),
            });
        }

        let mut response = (self.responder)(self.selected.unwrap_or_default(), &self.last_write);
        response.resize(buffer.len(), 0);
        let count = match self.read_faults.get(&self.reads) {
            Some(Fault::Short(n)) => (*n).min(buffer.len()),
            _ => buffer.len(),
        };
        buffer[..count].copy_from_slice(&response[..count]);
        Ok(count)
    }
}

/// Delay that records instead of sleeping.
#[derive(Debug, Clone)]
pub struct MockDelay {
    events: EventLog,
}

impl Delay for MockDelay {
    fn delay(&mut self, duration: Duration) {
        if let Ok(mut events) = self.events.lock() {
            events.push(BusEvent::Delay(duration));
        }
    }
}
