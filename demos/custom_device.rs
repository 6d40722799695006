//! Example: Custom Device
//!
//! Shows the extension point for a physical link other than the bundled
//! `skin_device::SerialDevice`/`SimulatedSkin` — anything implementing
//! `skin_traits::Device` can be handed to `Sensor::new`.

use skin_traits::Device;
use std::time::Duration;

/// A device that always reports itself as writable and discards every
/// control byte; useful as a starting point for a custom transport (e.g. a
/// TCP-bridged sensor) that doesn't need real backpressure handling.
pub struct AlwaysWritable<D> {
    inner: D,
}

impl<D: Device> Device for AlwaysWritable<D> {
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.inner.read_exact(buf)
    }

    fn write_all(&mut self, _buf: &[u8]) -> std::io::Result<()> {
        Ok(())
    }

    fn poll_writable(&mut self, _timeout: Duration) -> std::io::Result<bool> {
        Ok(true)
    }
}
