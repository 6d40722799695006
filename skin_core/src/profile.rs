//! Per-patch, per-cell calibration table (spec.md §4.B).
//!
//! Dense-per-patch, sparse-across-patches, per the §9 design note: an
//! `index` map from patch id to a dense `Vec` slot grows by doubling, while
//! each patch's sixteen cells live in a fixed-size array (a cell id is a
//! 4-bit wire field, so sixteen is a hard upper bound, not a guess).
use crate::smoother::Smoother;

/// Maximum cells addressable per patch — the wire format's cell nibble.
pub const MAX_CELLS_PER_PATCH: usize = 16;

/// One patch's cell slots.
#[derive(Debug, Clone)]
pub struct PatchEntry {
    cells: Vec<Smoother>,
}

impl PatchEntry {
    fn new(cell_alpha: f64, history_capacity: usize) -> Self {
        Self {
            cells: (0..MAX_CELLS_PER_PATCH)
                .map(|_| Smoother::new(history_capacity, cell_alpha))
                .collect(),
        }
    }

    pub fn cell(&self, cell_id: u32) -> Option<&Smoother> {
        self.cells.get(cell_id as usize)
    }

    pub fn cell_mut(&mut self, cell_id: u32) -> Option<&mut Smoother> {
        self.cells.get_mut(cell_id as usize)
    }

    pub fn cells(&self) -> &[Smoother] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Smoother] {
        &mut self.cells
    }
}

/// Errors from loading a profile row that can never correspond to a wire
/// address (e.g. a cell id wider than the nibble allows).
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileLoadError {
    CellOutOfRange { patch: u32, cell: u32 },
}

impl std::fmt::Display for ProfileLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileLoadError::CellOutOfRange { patch, cell } => {
                write!(f, "cell {cell} out of range for patch {patch} (max {MAX_CELLS_PER_PATCH})")
            }
        }
    }
}

impl std::error::Error for ProfileLoadError {}

/// The calibration table: patch id (1-based, as on the wire) → patch entry.
pub struct Profile {
    index: Vec<Option<usize>>,
    patches: Vec<PatchEntry>,
    cell_alpha: f64,
    history_capacity: usize,
}

impl Profile {
    pub fn new(cell_alpha: f64, history_capacity: usize) -> Self {
        Self {
            index: Vec::new(),
            patches: Vec::new(),
            cell_alpha,
            history_capacity,
        }
    }

    fn ensure_index_capacity(&mut self, patch_id: u32) {
        let needed = patch_id as usize; // 1-based id -> index `patch_id - 1`
        if needed > self.index.len() {
            let new_len = needed.max(self.index.len().saturating_mul(2)).max(1);
            self.index.resize(new_len, None);
        }
    }

    /// Fetch or create the patch entry for `patch_id` (1-based), growing
    /// the index map by doubling when needed.
    pub fn get_or_create(&mut self, patch_id: u32) -> &mut PatchEntry {
        assert!(patch_id >= 1, "patch id must be >= 1");
        self.ensure_index_capacity(patch_id);
        let slot = &mut self.index[(patch_id - 1) as usize];
        let idx = match *slot {
            Some(i) => i,
            None => {
                let i = self.patches.len();
                self.patches.push(PatchEntry::new(self.cell_alpha, self.history_capacity));
                *slot = Some(i);
                i
            }
        };
        &mut self.patches[idx]
    }

    pub fn get(&self, patch_id: u32) -> Option<&PatchEntry> {
        if patch_id < 1 {
            return None;
        }
        let slot = self.index.get((patch_id - 1) as usize)?;
        slot.map(|i| &self.patches[i])
    }

    pub fn get_mut(&mut self, patch_id: u32) -> Option<&mut PatchEntry> {
        if patch_id < 1 {
            return None;
        }
        let slot = *self.index.get((patch_id - 1) as usize)?;
        slot.map(move |i| &mut self.patches[i])
    }

    pub fn set_baseline(&mut self, patch_id: u32, cell_id: u32, value: i64) {
        if let Some(cell) = self.get_or_create(patch_id).cell_mut(cell_id) {
            cell.set_baseline(value);
        }
    }

    /// Zero all baselines across every known patch/cell; leave polynomial
    /// coefficients untouched.
    pub fn tare(&mut self) {
        for patch in &mut self.patches {
            for cell in patch.cells_mut() {
                cell.set_baseline(0);
            }
        }
    }

    /// Rejects alpha outside `(0, 1]`. On accept, applies to every known
    /// cell immediately and becomes the default for cells created later.
    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), &'static str> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err("alpha must be in (0, 1]");
        }
        self.cell_alpha = alpha;
        for patch in &mut self.patches {
            for cell in patch.cells_mut() {
                // Range already validated above.
                let _ = cell.set_alpha(alpha);
            }
        }
        Ok(())
    }

    /// Load rows produced by `skin_config::profile::load_from_csv`.
    /// Duplicated cells overwrite (last row for a given address wins).
    pub fn load_rows(&mut self, rows: &[skin_config::ProfileRow]) -> Result<(), ProfileLoadError> {
        for row in rows {
            if row.cell as usize >= MAX_CELLS_PER_PATCH {
                return Err(ProfileLoadError::CellOutOfRange {
                    patch: row.patch,
                    cell: row.cell,
                });
            }
            let entry = self.get_or_create(row.patch);
            // Unwrap is safe: cell index was just range-checked above.
            if let Some(cell) = entry.cell_mut(row.cell) {
                cell.set_baseline(row.baseline);
                cell.set_coefficients(row.c0, row.c1, row.c2);
            }
        }
        Ok(())
    }
}
