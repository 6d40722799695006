//! Test doubles for `skin_traits::Device`, shared by unit and integration
//! tests across this crate.
use std::collections::VecDeque;
use std::time::Duration;

use skin_traits::Device;

/// A device backed by a byte queue. `read_exact` drains it; `write_all`
/// records every byte written so a test can assert on control-byte traffic.
pub struct MockDevice {
    pub unread: VecDeque<u8>,
    pub written: Vec<u8>,
    pub writable: bool,
}

impl MockDevice {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            unread: bytes.into(),
            written: Vec::new(),
            writable: true,
        }
    }

    /// Appends bytes that will be handed out once `bytes` runs dry, as many
    /// times as needed — useful so a reader under test can keep refilling
    /// without exhausting the mock mid-test.
    pub fn pad_with_zeros(mut self, n: usize) -> Self {
        self.unread.extend(std::iter::repeat(0u8).take(n));
        self
    }
}

impl Device for MockDevice {
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        if self.unread.len() < buf.len() {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        }
        for slot in buf.iter_mut() {
            *slot = self.unread.pop_front().unwrap_or(0);
        }
        Ok(())
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.written.extend_from_slice(buf);
        Ok(())
    }

    fn poll_writable(&mut self, _timeout: Duration) -> std::io::Result<bool> {
        Ok(self.writable)
    }
}
