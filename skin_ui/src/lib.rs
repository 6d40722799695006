#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Thin display-formatting helpers for a future skin-sensor UI.
//!
//! Kept minimal on purpose: no language-binding glue lives here (spec.md
//! §1 puts that out of scope), just the one bit of text formatting both a
//! CLI and a richer UI would otherwise duplicate.

/// One line per cell, `patch.cell=value`, for a quick textual dump of a
/// patch's current readings.
pub fn format_patch_row(patch: u32, cells: &[f64]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(cell, value)| format!("{patch}.{cell}={value:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}
