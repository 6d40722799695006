//! A software-only `Device` that manufactures a plausible sensor byte
//! stream, for demos and for exercising the facade without a physical link.
use std::time::Duration;

use skin_traits::{Device, OpenDevice};
use tracing::trace;

const MAGIC: u8 = 0x55;

/// Cycles through `patches * cells` addresses, emitting a slowly-ramping
/// triangle-wave value for each so a caller can watch smoothed readings
/// move without needing real hardware.
pub struct SimulatedSkin {
    patches: u8,
    cells: u8,
    patch: u8,
    cell: u8,
    tick: i32,
    peak: i32,
    pending: Vec<u8>,
}

impl SimulatedSkin {
    pub fn new(patches: u8, cells: u8) -> Self {
        Self {
            patches: patches.max(1),
            cells: cells.max(1),
            patch: 1,
            cell: 0,
            tick: 0,
            peak: 2_000_000,
            pending: Vec::new(),
        }
    }

    fn advance_address(&mut self) {
        self.cell += 1;
        if self.cell >= self.cells {
            self.cell = 0;
            self.patch = if self.patch >= self.patches {
                1
            } else {
                self.patch + 1
            };
        }
    }

    fn next_value(&mut self) -> i32 {
        // Triangle wave so the signed 24-bit range and its sign bit both see
        // exercise over time.
        let period = self.peak * 2;
        self.tick = (self.tick + 4_000) % period;
        if self.tick < self.peak {
            self.tick - self.peak / 2
        } else {
            (period - self.tick) - self.peak / 2
        }
    }

    fn encode_next_record(&mut self) -> [u8; 5] {
        let value = self.next_value();
        let bits = (value as u32) & 0x00FF_FFFF;
        let addr = ((self.patch & 0x0F) << 4) | (self.cell & 0x0F);
        let record = [
            MAGIC,
            addr,
            (bits >> 16) as u8,
            (bits >> 8) as u8,
            bits as u8,
        ];
        self.advance_address();
        record
    }
}

impl Device for SimulatedSkin {
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        while self.pending.len() < buf.len() {
            self.pending.extend_from_slice(&self.encode_next_record());
        }
        let tail = self.pending.split_off(buf.len());
        buf.copy_from_slice(&self.pending);
        self.pending = tail;
        trace!(bytes = buf.len(), "simulated skin produced bytes");
        Ok(())
    }

    fn write_all(&mut self, _buf: &[u8]) -> std::io::Result<()> {
        Ok(())
    }

    fn poll_writable(&mut self, _timeout: Duration) -> std::io::Result<bool> {
        Ok(true)
    }
}

impl OpenDevice for SimulatedSkin {
    /// `path` is ignored; kept so `SimulatedSkin` satisfies the same
    /// path-based constructors a real device would.
    fn open(_path: &str) -> std::io::Result<Self> {
        Ok(Self::new(1, 16))
    }
}
