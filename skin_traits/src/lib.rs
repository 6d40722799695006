#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Traits that define the hardware and time abstractions used by the system.
//!
//! - `Device` is the serial character device seam: open, blocking read/write,
//!   and a bounded-timeout writable-poll, matching the reader task's needs.
//! - `clock` offers a `MonotonicClock` for deterministic timing and testability.
//!
//! Other crates depend only on these traits, enabling a simulated device and a
//! real serial backend while keeping `skin_core` hardware-agnostic.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// A serial character device: the seam between `skin_core`'s reader task and
/// whatever actually owns the file descriptor (real tty or a test double).
///
/// Implementations are not required to be `Send`; the type that wraps one for
/// the reader thread must be.
pub trait Device {
    /// Fill `buf` completely, looping over short reads. Any error is fatal to
    /// the caller — per spec, device reads never recover.
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()>;

    /// Write `buf`, looping over short writes.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Block up to `timeout` for the device to become writable. `Ok(false)`
    /// means the timeout elapsed without becoming writable; callers should
    /// warn and drop the pending control byte rather than treat it as fatal.
    fn poll_writable(&mut self, timeout: Duration) -> std::io::Result<bool>;
}

impl<T: ?Sized + Device> Device for Box<T> {
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        (**self).read_exact(buf)
    }
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        (**self).write_all(buf)
    }
    fn poll_writable(&mut self, timeout: Duration) -> std::io::Result<bool> {
        (**self).poll_writable(timeout)
    }
}

/// A `Device` that also knows how to open itself from a path string (a real
/// tty path, or a simulator's identifier). Kept separate from `Device` so
/// that test doubles built directly from in-memory buffers never need to
/// implement a meaningless `open`.
pub trait OpenDevice: Device + Sized {
    fn open(path: &str) -> std::io::Result<Self>;
}
