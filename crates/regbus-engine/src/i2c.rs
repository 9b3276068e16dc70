//! Linux `/dev/i2c-N` bus.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::bus::BusPort;
use crate::error::{BusError, BusResult};

/// `I2C_SLAVE` request from `linux/i2c-dev.h`.
const I2C_SLAVE: u32 = 0x0703;

/// An open I2C adapter.
///
/// The device file is closed when the value is dropped, on every exit path.
#[derive(Debug)]
pub struct LinuxI2cBus {
    file: File,
    path: PathBuf,
}

impl LinuxI2cBus {
    /// Open the adapter read/write.
    pub fn open(path: impl AsRef<Path>) -> BusResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| BusError::Open {
                path: path.display().to_string(),
                source,
            })?;
        info!(device = %path.display(), "I2C bus opened");
        Ok(LinuxI2cBus { file, path })
    }

    /// Device node path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BusPort for LinuxI2cBus {
    fn select_peer(&mut self, address: u16) -> BusResult<()> {
        // SAFETY: the descriptor is owned by `self.file` and stays open for
        // the duration of the call; I2C_SLAVE takes the address by value.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                I2C_SLAVE as _,
                libc::c_ulong::from(address),
            )
        };
        if rc < 0 {
            return Err(BusError::SelectPeer {
                address,
                source: io::Error::last_os_error(),
            });
        }
        debug!("selected peer 0x{:02X}", address);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> BusResult<usize> {
        self.file
            .write(bytes)
            .map_err(|source| BusError::Io { op: "write", source })
    }

    fn read(&mut self, buffer: &mut [u8]) -> BusResult<usize> {
        self.file
            .read(buffer)
            .map_err(|source| BusError::Io { op: "read", source })
    }
}

impl Drop for LinuxI2cBus {
    fn drop(&mut self) {
        info!(device = %self.path.display(), "I2C bus closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        let err = LinuxI2cBus::open("/nonexistent/i2c-99").unwrap_err();
        match err {
            BusError::Open { path, .. } => assert_eq!(path, "/nonexistent/i2c-99"),
            other => panic!("expected open error, got {:?}", other),
        }
    }

    #[test]
    fn test_select_on_regular_file_fails() {
        // A plain file accepts read/write but not the I2C ioctl.
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut bus = LinuxI2cBus::open(file.path()).unwrap();
        assert_eq!(bus.path(), file.path());
        assert!(matches!(
            bus.select_peer(0x10),
            Err(BusError::SelectPeer { address: 0x10, .. })
        ));
    }
}
