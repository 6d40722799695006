#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! File parsing for the tactile sensor driver.
//!
//! Per spec.md §1, this crate is an external collaborator: it only produces
//! plain data tables (`ProfileRow`, `PatchRow`) from the profile CSV and the
//! layout text file. `skin_core` owns the actual `Profile`/`Layout` types and
//! decides how duplicate rows, missing ids, and id→index mapping behave.
pub mod config;
pub mod error;
pub mod layout;
pub mod profile;

pub use config::DriverConfig;
pub use error::{LayoutError, ProfileError};
pub use layout::{CellRow, PatchRow};
pub use profile::ProfileRow;
