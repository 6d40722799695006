//! Static map from patch id to cell-id set and `(x, y)` positions
//! (spec.md §4.C).
use skin_config::PatchRow;

/// Highest patch id representable in the wire format's 4-bit nibble.
pub const PATCH_WIRE_MAX: u32 = 15;
/// Highest cell id representable in the wire format's 4-bit nibble.
pub const CELL_WIRE_MAX: u32 = 15;

/// One patch's cell ids and their `(x, y)` positions in a local frame.
#[derive(Debug, Clone)]
pub struct PatchDescriptor {
    pub patch_id: u32,
    pub cell_ids: Vec<u32>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl PatchDescriptor {
    fn new(patch_id: u32, cells: Vec<(u32, f64, f64)>) -> Self {
        let mut xmin = f64::INFINITY;
        let mut xmax = f64::NEG_INFINITY;
        let mut ymin = f64::INFINITY;
        let mut ymax = f64::NEG_INFINITY;
        let mut cell_ids = Vec::with_capacity(cells.len());
        let mut x = Vec::with_capacity(cells.len());
        let mut y = Vec::with_capacity(cells.len());
        for (id, cx, cy) in cells {
            cell_ids.push(id);
            x.push(cx);
            y.push(cy);
            xmin = xmin.min(cx);
            xmax = xmax.max(cx);
            ymin = ymin.min(cy);
            ymax = ymax.max(cy);
        }
        if cell_ids.is_empty() {
            xmin = 0.0;
            xmax = 0.0;
            ymin = 0.0;
            ymax = 0.0;
        }
        Self {
            patch_id,
            cell_ids,
            x,
            y,
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn local_index_of(&self, cell_id: u32) -> Option<usize> {
        self.cell_ids.iter().position(|&c| c == cell_id)
    }

    pub fn clamp_to_bounds(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(self.xmin, self.xmax), y.clamp(self.ymin, self.ymax))
    }
}

/// Result of validating a `(patch, cell)` address against the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressCheck {
    Valid,
    PatchOutOfRange,
    PatchUnknown,
    CellOutOfRange,
    CellUnknown,
}

/// An ordered list of patches plus a reverse patch-id → index map.
pub struct Layout {
    patches: Vec<PatchDescriptor>,
    index: Vec<Option<usize>>,
}

impl Layout {
    pub fn from_rows(rows: &[PatchRow]) -> Self {
        let mut layout = Layout {
            patches: Vec::with_capacity(rows.len()),
            index: Vec::new(),
        };
        for row in rows {
            let cells = row
                .cells
                .iter()
                .map(|c| (c.cell_id, c.x, c.y))
                .collect::<Vec<_>>();
            layout.push_patch(row.patch_id, cells);
        }
        layout
    }

    fn push_patch(&mut self, patch_id: u32, cells: Vec<(u32, f64, f64)>) {
        let idx = self.patches.len();
        self.patches.push(PatchDescriptor::new(patch_id, cells));
        let needed = patch_id as usize;
        if needed > self.index.len() {
            self.index.resize(needed.max(self.index.len() * 2).max(1), None);
        }
        self.index[(patch_id - 1) as usize] = Some(idx);
    }

    /// A synthetic layout with `num_patches` patches of `num_cells` cells
    /// each, arranged in a roughly square grid with unit spacing centered
    /// at the origin (spec.md §4.F's "trivial layout" for `init()`).
    pub fn trivial(num_patches: u32, num_cells: u32) -> Self {
        let side = (f64::from(num_cells)).sqrt().ceil() as u32;
        let side = side.max(1);
        let half = (f64::from(side) - 1.0) / 2.0;
        let mut layout = Layout {
            patches: Vec::with_capacity(num_patches as usize),
            index: Vec::new(),
        };
        for p in 1..=num_patches {
            let cells: Vec<(u32, f64, f64)> = (0..num_cells)
                .map(|c| {
                    let row = c / side;
                    let col = c % side;
                    let x = f64::from(col) - half;
                    let y = f64::from(row) - half;
                    (c, x, y)
                })
                .collect();
            layout.push_patch(p, cells);
        }
        layout
    }

    /// The canonical 8-patch, 16-cell-per-patch reference topology
    /// (SPEC_FULL.md §2, from original_source's octocan constructor).
    pub fn octocan() -> Self {
        Self::trivial(8, 16)
    }

    pub fn patches(&self) -> &[PatchDescriptor] {
        &self.patches
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn index_of(&self, patch_id: u32) -> Option<usize> {
        if patch_id < 1 {
            return None;
        }
        self.index.get((patch_id - 1) as usize).copied().flatten()
    }

    pub fn patch(&self, patch_id: u32) -> Option<&PatchDescriptor> {
        self.index_of(patch_id).map(|i| &self.patches[i])
    }

    /// Classify a `(patch, cell)` address exactly one of the spec's four
    /// reject buckets, or `Valid`.
    pub fn check(&self, patch_id: u32, cell_id: u32) -> AddressCheck {
        if patch_id < 1 || patch_id > PATCH_WIRE_MAX {
            return AddressCheck::PatchOutOfRange;
        }
        let Some(patch) = self.patch(patch_id) else {
            return AddressCheck::PatchUnknown;
        };
        if cell_id > CELL_WIRE_MAX {
            return AddressCheck::CellOutOfRange;
        }
        if patch.local_index_of(cell_id).is_none() {
            return AddressCheck::CellUnknown;
        }
        AddressCheck::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_layout_four_by_four_has_expected_coordinates() {
        let layout = Layout::trivial(1, 16);
        let patch = layout.patch(1).unwrap();
        let mut xs: Vec<f64> = patch.x.clone();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        xs.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        assert_eq!(xs, vec![-1.5, -0.5, 0.5, 1.5]);
    }

    #[test]
    fn octocan_is_eight_patches_sixteen_cells() {
        let layout = Layout::octocan();
        assert_eq!(layout.len(), 8);
        assert_eq!(layout.patch(1).unwrap().cell_ids.len(), 16);
    }

    #[test]
    fn address_check_buckets() {
        let layout = Layout::trivial(1, 16);
        assert_eq!(layout.check(1, 0), AddressCheck::Valid);
        assert_eq!(layout.check(0, 0), AddressCheck::PatchOutOfRange);
        assert_eq!(layout.check(2, 0), AddressCheck::PatchUnknown);
        assert_eq!(layout.check(1, 20), AddressCheck::CellOutOfRange);
        assert_eq!(layout.check(1, 15), AddressCheck::CellUnknown);
    }
}
