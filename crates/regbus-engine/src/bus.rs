//! Capabilities the transaction engine drives: the bus itself and the settle
//! delay.

use std::time::Duration;

use crate::error::BusResult;

/// A synchronous request/response byte bus with addressable peers.
///
/// Implementations report how many bytes actually moved; detecting short
/// transfers is the engine's job.
pub trait BusPort {
    /// Address subsequent writes and reads to `address`.
    fn select_peer(&mut self, address: u16) -> BusResult<()>;

    /// Write `bytes` to the selected peer, returning the count accepted.
    fn write(&mut self, bytes: &[u8]) -> BusResult<usize>;

    /// Read into `buffer` from the selected peer, returning the count filled.
    fn read(&mut self, buffer: &mut [u8]) -> BusResult<usize>;
}

impl<T: BusPort + ?Sized> BusPort for &mut T {
    fn select_peer(&mut self, address: u16) -> BusResult<()> {
        (**self).select_peer(address)
    }

    fn write(&mut self, bytes: &[u8]) -> BusResult<usize> {
        (**self).write(bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> BusResult<usize> {
        (**self).read(buffer)
    }
}

/// Blocking wait used for the settle delay and sweep pacing.
pub trait Delay {
    /// Block for `duration`.
    fn delay(&mut self, duration: Duration);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}

/// [`Delay`] backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
