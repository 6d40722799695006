//! Example: Minimal Simulated Device
//!
//! A device that always reports a constant value on every cell, simpler
//! than `skin_device::SimulatedSkin`'s ramping waveform — useful when a test
//! or demo needs a fixed, predictable reading instead of motion.

use skin_traits::Device;
use std::time::Duration;

pub struct ConstantSkin {
    patches: u8,
    cells: u8,
    patch: u8,
    cell: u8,
    value: i32,
}

impl ConstantSkin {
    pub fn new(patches: u8, cells: u8, value: i32) -> Self {
        Self {
            patches: patches.max(1),
            cells: cells.max(1),
            patch: 1,
            cell: 0,
            value,
        }
    }
}

impl Device for ConstantSkin {
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        for chunk in buf.chunks_mut(5) {
            let bits = (self.value as u32) & 0x00FF_FFFF;
            let addr = ((self.patch & 0x0F) << 4) | (self.cell & 0x0F);
            let record = [0x55, addr, (bits >> 16) as u8, (bits >> 8) as u8, bits as u8];
            chunk.copy_from_slice(&record[..chunk.len()]);

            self.cell += 1;
            if self.cell >= self.cells {
                self.cell = 0;
                self.patch = if self.patch >= self.patches { 1 } else { self.patch + 1 };
            }
        }
        Ok(())
    }

    fn write_all(&mut self, _buf: &[u8]) -> std::io::Result<()> {
        Ok(())
    }

    fn poll_writable(&mut self, _timeout: Duration) -> std::io::Result<bool> {
        Ok(true)
    }
}
