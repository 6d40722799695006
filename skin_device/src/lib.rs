#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Concrete `skin_traits::Device` backends: a real serial-port link behind
//! the `hardware` feature, and a software simulator that needs nothing.
//!
//! `skin_core` never names either type directly; callers pick one at the
//! edge (the CLI or a demo) and hand it to `Sensor::new` or one of the
//! `Sensor::init*` path-based constructors through `OpenDevice`.

pub mod error;
pub mod sim;

#[cfg(feature = "hardware")]
pub mod serial;

pub use error::DeviceError;
pub use sim::SimulatedSkin;

#[cfg(feature = "hardware")]
pub use serial::SerialDevice;
