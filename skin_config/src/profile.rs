//! Calibration profile CSV: a plain data-table producer (spec.md §1 — out of
//! scope for the core, which only consumes the rows it returns).
//!
//! Header: `patch,cell,baseline,c0,c1,c2`. One row per cell; duplicated cells
//! are left to the caller to overwrite (the core's `Profile::set_baseline`
//! semantics), this module just reports what the file says, in order.
use std::path::Path;

use serde::Deserialize;

use crate::error::{ProfileError, ProfileResult};

const EXPECTED_HEADER: [&str; 6] = ["patch", "cell", "baseline", "c0", "c1", "c2"];

/// One row of the profile CSV, after header validation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProfileRow {
    pub patch: u32,
    pub cell: u32,
    pub baseline: i64,
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Parse a profile CSV from a path. Tolerates trailing empty lines.
pub fn load_from_csv(path: &Path) -> ProfileResult<Vec<ProfileRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ProfileError::Open {
            path: path.to_path_buf(),
            source: io_error(e),
        })?;

    let headers = rdr
        .headers()
        .map_err(|e| ProfileError::Open {
            path: path.to_path_buf(),
            source: io_error(e),
        })?
        .clone();
    for (idx, col) in headers.iter().enumerate() {
        let expected = EXPECTED_HEADER.get(idx).copied().unwrap_or("");
        if col != expected {
            return Err(ProfileError::UnknownColumn {
                path: path.to_path_buf(),
                column: col.to_string(),
            });
        }
    }
    if headers.len() != EXPECTED_HEADER.len() {
        return Err(ProfileError::UnknownColumn {
            path: path.to_path_buf(),
            column: format!(
                "expected {} columns, got {}",
                EXPECTED_HEADER.len(),
                headers.len()
            ),
        });
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ProfileRow>().enumerate() {
        // Header occupies line 1, so the first data row is line 2.
        let line = idx as u64 + 2;
        let row: ProfileRow = rec.map_err(|e| ProfileError::Row {
            path: path.to_path_buf(),
            line,
            reason: e.to_string(),
        })?;
        if row.patch < 1 {
            return Err(ProfileError::Row {
                path: path.to_path_buf(),
                line,
                reason: "patch id must be >= 1".to_string(),
            });
        }
        rows.push(row);
    }
    Ok(rows)
}

fn io_error(e: csv::Error) -> std::io::Error {
    std::io::Error::other(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_basic_rows() {
        let f = write_tmp("patch,cell,baseline,c0,c1,c2\n1,0,10,2,3,0\n1,1,20,0,0,0\n");
        let rows = load_from_csv(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].patch, 1);
        assert_eq!(rows[0].baseline, 10);
        assert_eq!(rows[1].c1, 0.0);
    }

    #[test]
    fn tolerates_trailing_blank_lines() {
        let f = write_tmp("patch,cell,baseline,c0,c1,c2\n1,0,10,2,3,0\n\n");
        let rows = load_from_csv(f.path()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn rejects_unknown_header() {
        let f = write_tmp("patch,cell,base,c0,c1,c2\n1,0,10,2,3,0\n");
        let err = load_from_csv(f.path()).unwrap_err();
        assert!(matches!(err, ProfileError::UnknownColumn { .. }));
    }

    #[test]
    fn rejects_bad_patch_id_with_line_number() {
        let f = write_tmp("patch,cell,baseline,c0,c1,c2\n0,0,10,2,3,0\n");
        let err = load_from_csv(f.path()).unwrap_err();
        match err {
            ProfileError::Row { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_cells_both_kept_for_caller_to_overwrite() {
        let f = write_tmp("patch,cell,baseline,c0,c1,c2\n1,0,10,2,3,0\n1,0,11,2,3,0\n");
        let rows = load_from_csv(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
