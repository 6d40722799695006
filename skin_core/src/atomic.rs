//! Observability counters (spec.md §3, §5): monotonically non-decreasing
//! over a session, updated outside the shared-state mutex since Rust gives
//! us real atomic integers (§9 design note on minimizing lock scope).
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counters {
    pub total_bytes: AtomicU64,
    pub accepted: AtomicU64,
    pub rejected_patch_out_of_range: AtomicU64,
    pub rejected_patch_unknown: AtomicU64,
    pub rejected_cell_out_of_range: AtomicU64,
    pub rejected_cell_unknown: AtomicU64,
    pub resync_advances: AtomicU64,
    pub misalignment_events: AtomicU64,
}

/// A stable, read-only snapshot of `Counters` for foreground callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total_bytes: u64,
    pub accepted: u64,
    pub rejected_patch_out_of_range: u64,
    pub rejected_patch_unknown: u64,
    pub rejected_cell_out_of_range: u64,
    pub rejected_cell_unknown: u64,
    pub resync_advances: u64,
    pub misalignment_events: u64,
}

impl Counters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_patch_out_of_range: self.rejected_patch_out_of_range.load(Ordering::Relaxed),
            rejected_patch_unknown: self.rejected_patch_unknown.load(Ordering::Relaxed),
            rejected_cell_out_of_range: self.rejected_cell_out_of_range.load(Ordering::Relaxed),
            rejected_cell_unknown: self.rejected_cell_unknown.load(Ordering::Relaxed),
            resync_advances: self.resync_advances.load(Ordering::Relaxed),
            misalignment_events: self.misalignment_events.load(Ordering::Relaxed),
        }
    }

    pub fn add_total_bytes(&self, n: u64) {
        self.total_bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected_patch_out_of_range.load(Ordering::Relaxed)
            + self.rejected_patch_unknown.load(Ordering::Relaxed)
            + self.rejected_cell_out_of_range.load(Ordering::Relaxed)
            + self.rejected_cell_unknown.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let c = Counters::default();
        c.add_total_bytes(10);
        c.accepted.fetch_add(1, Ordering::Relaxed);
        let snap = c.snapshot();
        assert_eq!(snap.total_bytes, 10);
        assert_eq!(snap.accepted, 1);
    }
}
