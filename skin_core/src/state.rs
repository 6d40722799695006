//! The single mutex-protected region: smoothed cell store, pressure
//! aggregates, the calibrating/shutdown flags, and the profile table
//! (spec.md §5). Counters live outside it in `crate::atomic::Counters`.
use crate::layout::Layout;
use crate::pressure::PressureAggregate;
use crate::profile::Profile;

pub struct SharedState {
    pub profile: Profile,
    pub pressure: Vec<PressureAggregate>,
    pub calibrating: bool,
    pub shutdown: bool,
}

impl SharedState {
    pub fn new(layout: &Layout, cell_alpha: f64, pressure_alpha: f64, history_capacity: usize) -> Self {
        Self {
            profile: Profile::new(cell_alpha, history_capacity),
            pressure: (0..layout.len())
                .map(|_| PressureAggregate::new(pressure_alpha))
                .collect(),
            calibrating: false,
            shutdown: false,
        }
    }
}

/// Locks `m`, recovering the guard instead of panicking if a previous
/// holder panicked while it was held — a reader-thread panic should not
/// permanently wedge every foreground query.
pub fn lock(m: &std::sync::Mutex<SharedState>) -> std::sync::MutexGuard<'_, SharedState> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
