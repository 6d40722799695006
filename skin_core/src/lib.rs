#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Hardware-agnostic acquisition pipeline for a tactile skin sensor.
//!
//! All device interaction goes through `skin_traits::Device`; this crate only
//! knows how to frame the wire protocol, calibrate and smooth raw samples,
//! and expose the result through a small query API.
//!
//! ## Architecture
//!
//! - **Protocol**: self-synchronizing framing and 24-bit signed decode (`protocol`)
//! - **Calibration**: per-cell polynomial and baseline (`smoother`, `profile`)
//! - **Layout**: the sparse patch/cell address table (`layout`)
//! - **Pressure**: per-patch magnitude and centroid aggregates (`pressure`)
//! - **Reader**: the worker thread driving the device (`reader`)
//! - **Facade**: the public `Sensor<D>` lifecycle and query surface (`facade`)
//! - **Logging**: CSV sample and debug event loggers (`logger`)

pub mod atomic;
pub mod error;
pub mod facade;
pub mod layout;
pub mod logger;
pub mod mocks;
pub mod pressure;
pub mod profile;
pub mod protocol;
pub mod reader;
pub mod smoother;
pub mod state;

pub use error::{CoreError, Result};
pub use facade::{Sensor, SensorSnapshot};
pub use layout::{AddressCheck, Layout, PatchDescriptor};
pub use protocol::ProtocolMode;
