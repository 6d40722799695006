//! Layout text file: a plain data-table producer (spec.md §1). Format:
//!
//! ```text
//! N
//! patch_id,num_cells
//! cell_id,x,y
//! ... (num_cells rows)
//! ... (repeated N times)
//! ```
//!
//! Commas or whitespace separate fields (spec.md §6).
use std::path::Path;

use crate::error::{LayoutError, LayoutResult};

/// One cell's local-frame coordinate within its patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRow {
    pub cell_id: u32,
    pub x: f64,
    pub y: f64,
}

/// One patch's header plus its cell rows, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRow {
    pub patch_id: u32,
    pub cells: Vec<CellRow>,
}

/// Parse a layout file from a path.
pub fn load(path: &Path) -> LayoutResult<Vec<PatchRow>> {
    let text = std::fs::read_to_string(path).map_err(|source| LayoutError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse(text: &str, path: &Path) -> LayoutResult<Vec<PatchRow>> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, l)| (idx as u64 + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    let row_err = |line: u64, reason: String| LayoutError::Row {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let (count_line, count_text) = lines.next().ok_or_else(|| {
        row_err(1, "expected patch count as the first line".to_string())
    })?;
    let fields = split_fields(count_text);
    if fields.len() != 1 {
        return Err(row_err(
            count_line,
            format!("expected a single patch count, got {:?}", fields),
        ));
    }
    let num_patches: usize = fields[0]
        .parse()
        .map_err(|_| row_err(count_line, format!("invalid patch count {:?}", fields[0])))?;

    let mut patches = Vec::with_capacity(num_patches);
    for _ in 0..num_patches {
        let (header_line, header_text) = lines
            .next()
            .ok_or_else(|| row_err(count_line, "unexpected end of file in patch header".to_string()))?;
        let header_fields = split_fields(header_text);
        if header_fields.len() != 2 {
            return Err(row_err(
                header_line,
                format!("expected patch_id,num_cells, got {:?}", header_fields),
            ));
        }
        let patch_id: u32 = header_fields[0]
            .parse()
            .map_err(|_| row_err(header_line, format!("invalid patch id {:?}", header_fields[0])))?;
        let num_cells: usize = header_fields[1].parse().map_err(|_| {
            row_err(header_line, format!("invalid cell count {:?}", header_fields[1]))
        })?;

        let mut cells = Vec::with_capacity(num_cells);
        for _ in 0..num_cells {
            let (cell_line, cell_text) = lines
                .next()
                .ok_or_else(|| row_err(header_line, "unexpected end of file in cell rows".to_string()))?;
            let cell_fields = split_fields(cell_text);
            if cell_fields.len() != 3 {
                return Err(row_err(
                    cell_line,
                    format!("expected cell_id,x,y, got {:?}", cell_fields),
                ));
            }
            let cell_id: u32 = cell_fields[0]
                .parse()
                .map_err(|_| row_err(cell_line, format!("invalid cell id {:?}", cell_fields[0])))?;
            let x: f64 = cell_fields[1]
                .parse()
                .map_err(|_| row_err(cell_line, format!("invalid x {:?}", cell_fields[1])))?;
            let y: f64 = cell_fields[2]
                .parse()
                .map_err(|_| row_err(cell_line, format!("invalid y {:?}", cell_fields[2])))?;
            cells.push(CellRow { cell_id, x, y });
        }
        patches.push(PatchRow { patch_id, cells });
    }

    Ok(patches)
}
