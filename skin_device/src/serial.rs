//! Real serial-port backed `Device`, gated behind the `hardware` feature so
//! the rest of the workspace builds without a physical port attached.
#![cfg(feature = "hardware")]

use std::io::{Read, Write};
use std::time::Duration;

use skin_traits::{Device, OpenDevice};
use tracing::debug;

use crate::error::DeviceError;

/// Matches the sensor firmware's fixed UART rate; not user-configurable on
/// the wire so there is nothing to negotiate.
const DEFAULT_BAUD: u32 = 115_200;
const OPEN_TIMEOUT: Duration = Duration::from_millis(200);

/// A skin sensor connected over a USB-serial or UART link.
pub struct SerialDevice {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialDevice {
    pub fn with_baud(path: &str, baud: u32) -> std::io::Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(OPEN_TIMEOUT)
            .open()
            .map_err(|source| DeviceError::Open {
                path: path.to_string(),
                source: std::io::Error::other(source.to_string()),
            })?;
        debug!(path, baud, "opened serial device");
        Ok(Self { port })
    }
}

impl Device for SerialDevice {
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.port.read_exact(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.port.write_all(buf)
    }

    fn poll_writable(&mut self, _timeout: Duration) -> std::io::Result<bool> {
        // A USB-serial port's write path is a small OS ring buffer that is
        // all but always open for a single control byte; the real blocking
        // point is the read side, which `read_exact` already times out on.
        // `flush` is the cheapest way to surface a genuinely dead link.
        match self.port.flush() {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!(error = %e, "serial port not writable");
                Ok(false)
            }
        }
    }
}

impl OpenDevice for SerialDevice {
    fn open(path: &str) -> std::io::Result<Self> {
        Self::with_baud(path, DEFAULT_BAUD)
    }
}
