//! The sensor facade (spec.md §4.F): lifecycle, configuration, query API,
//! and calibration control, generic over the serial device so it can be
//! driven by a mock in tests and a real tty in production.
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use skin_traits::{Device, OpenDevice};

use crate::atomic::{CounterSnapshot, Counters};
use crate::error::{CoreError, Result};
use crate::layout::{AddressCheck, Layout};
use crate::logger::{DebugLogger, SampleLogger};
use crate::protocol::ProtocolMode;
use crate::reader;
use crate::state::SharedState;

/// History length for every cell's ring buffer, absent other configuration.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

type BoxWrite = Box<dyn Write + Send>;

/// A snapshot of every cell and pressure aggregate, in layout order
/// (SPEC_FULL.md §2's whole-sensor query, layered on top of the
/// per-patch/per-cell queries §4.F names explicitly).
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    /// `cells[patch_index][local_cell_index]`.
    pub cells: Vec<Vec<f64>>,
    /// `(magnitude, x, y)` per patch, same order as `cells`.
    pub pressure: Vec<(f64, f64, f64)>,
}

/// Holds the layout, profile, smoothed store, pressure aggregates,
/// counters, and reader handle for one sensor instance.
pub struct Sensor<D: Device + Send + 'static> {
    device: Option<D>,
    layout: Arc<Layout>,
    state: Arc<Mutex<SharedState>>,
    counters: Arc<Counters>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    mode: ProtocolMode,
    sample_log: Option<SampleLogger<BoxWrite>>,
    debug_log: Option<Arc<Mutex<DebugLogger<BoxWrite>>>>,
}

impl<D: Device + Send + 'static> Sensor<D> {
    /// Build a sensor over an already-constructed device and layout. Every
    /// patch in `layout` is eagerly given a profile entry so a calibration
    /// window opened before the first sample for a patch still reaches it.
    pub fn new(device: D, layout: Layout) -> Self {
        let layout = Arc::new(layout);
        let mut state = SharedState::new(&layout, 1.0, 1.0, DEFAULT_HISTORY_CAPACITY);
        for patch in layout.patches() {
            state.profile.get_or_create(patch.patch_id);
        }
        Self {
            device: Some(device),
            layout,
            state: Arc::new(Mutex::new(state)),
            counters: Arc::new(Counters::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
            mode: ProtocolMode::Plain,
            sample_log: None,
            debug_log: None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Closes any open calibration window, then loads a profile CSV,
    /// overwriting the baseline and coefficients for every row it names.
    pub fn read_profile(&mut self, path: &Path) -> Result<()> {
        let rows = skin_config::profile::load_from_csv(path)?;
        let mut st = crate::state::lock(&self.state);
        if st.calibrating {
            close_calibration_locked(&self.layout, &mut st, self.debug_log.as_ref());
        }
        st.profile.load_rows(&rows)?;
        Ok(())
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
        let mut st = crate::state::lock(&self.state);
        st.profile.set_alpha(alpha).map_err(|_| CoreError::InvalidAlpha)
    }

    pub fn set_pressure_alpha(&mut self, alpha: f64) -> Result<()> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(CoreError::InvalidAlpha);
        }
        let mut st = crate::state::lock(&self.state);
        for agg in &mut st.pressure {
            let _ = agg.set_alpha(alpha);
        }
        Ok(())
    }

    /// Opens a calibration window on every known cell. A no-op (with a
    /// warning) if one is already open.
    pub fn calibrate_begin(&mut self) {
        let mut st = crate::state::lock(&self.state);
        if st.calibrating {
            tracing::warn!("calibrate_begin called with a window already open; ignoring");
            return;
        }
        st.calibrating = true;
        for patch in self.layout.patches() {
            if let Some(entry) = st.profile.get_mut(patch.patch_id) {
                for cell in entry.cells_mut() {
                    cell.calibrate_begin();
                }
            }
        }
    }

    /// Closes the calibration window: publishes each cell's mean as its new
    /// baseline and zeroes the smoothed store. A no-op if none is open.
    pub fn calibrate_end(&mut self) {
        let mut st = crate::state::lock(&self.state);
        if !st.calibrating {
            return;
        }
        close_calibration_locked(&self.layout, &mut st, self.debug_log.as_ref());
    }

    /// Must be called before `start()`; opens (or truncates) the file at
    /// `path` and owns the handle for the life of the session.
    pub fn log_stream(&mut self, path: &Path) -> Result<()> {
        if self.handle.is_some() {
            return Err(CoreError::AlreadyStarted);
        }
        let file = std::fs::File::create(path).map_err(CoreError::LogOpen)?;
        self.sample_log = Some(SampleLogger::new(Box::new(file)));
        Ok(())
    }

    /// Must be called before `start()`; see `log_stream`.
    pub fn debug_log_stream(&mut self, path: &Path) -> Result<()> {
        if self.handle.is_some() {
            return Err(CoreError::AlreadyStarted);
        }
        let file = std::fs::File::create(path).map_err(CoreError::LogOpen)?;
        self.debug_log = Some(Arc::new(Mutex::new(DebugLogger::new(Box::new(file)))));
        Ok(())
    }

    /// Opens the device for streaming and spawns the reader task.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(CoreError::AlreadyStarted);
        }
        let device = self.device.take().ok_or(CoreError::AlreadyStarted)?;
        self.shutdown.store(false, Ordering::Relaxed);

        let layout = self.layout.clone();
        let state = self.state.clone();
        let counters = self.counters.clone();
        let shutdown = self.shutdown.clone();
        let mode = self.mode;
        let sample_log = self.sample_log.take();
        let debug_log = self.debug_log.clone();

        self.handle = Some(std::thread::spawn(move || {
            reader::run(
                device, layout, state, counters, shutdown, mode, sample_log, debug_log,
            );
        }));
        Ok(())
    }

    /// Raises the shutdown flag. Idempotent and non-blocking; does not wait
    /// for the reader to observe it.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Joins the reader thread, if one is running.
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("reader thread panicked during shutdown");
            }
        }
    }

    pub fn cell(&self, patch: u32, cell: u32) -> Option<f64> {
        let st = crate::state::lock(&self.state);
        st.profile.get(patch)?.cell(cell).map(|s| s.expavg())
    }

    /// All of a patch's cell values, in the patch's declared cell order.
    pub fn patch_state(&self, patch: u32) -> Option<Vec<f64>> {
        let st = crate::state::lock(&self.state);
        let desc = self.layout.patch(patch)?;
        let entry = st.profile.get(patch)?;
        Some(
            desc.cell_ids
                .iter()
                .map(|&c| entry.cell(c).map_or(0.0, |s| s.expavg()))
                .collect(),
        )
    }

    pub fn patch_pressure(&self, patch: u32) -> Option<(f64, f64, f64)> {
        let st = crate::state::lock(&self.state);
        let idx = self.layout.index_of(patch)?;
        Some(st.pressure[idx].snapshot())
    }

    pub fn address_check(&self, patch: u32, cell: u32) -> AddressCheck {
        self.layout.check(patch, cell)
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// A snapshot of every cell and pressure aggregate, in layout order.
    pub fn state(&self) -> SensorSnapshot {
        let st = crate::state::lock(&self.state);
        let cells = self
            .layout
            .patches()
            .iter()
            .map(|patch| {
                patch
                    .cell_ids
                    .iter()
                    .map(|&c| {
                        st.profile
                            .get(patch.patch_id)
                            .and_then(|e| e.cell(c))
                            .map_or(0.0, |s| s.expavg())
                    })
                    .collect()
            })
            .collect();
        let pressure = st.pressure.iter().map(|p| p.snapshot()).collect();
        SensorSnapshot { cells, pressure }
    }
}

/// Closes the calibration window under an already-held lock: publishes
/// each cell's mean as its new baseline, warning once per empty cell, and
/// emits one `baseline,<patch>.<cell>=<value>` debug-log row per cell
/// (spec.md §4.G) when a debug log is attached.
fn close_calibration_locked(
    layout: &Layout,
    st: &mut SharedState,
    debug_log: Option<&Arc<Mutex<DebugLogger<BoxWrite>>>>,
) {
    for patch in layout.patches() {
        if let Some(entry) = st.profile.get_mut(patch.patch_id) {
            for (local_idx, cell) in entry.cells_mut().iter_mut().enumerate() {
                if !cell.calibrate_end() {
                    tracing::warn!(
                        patch = patch.patch_id,
                        "calibration window closed with zero samples; baseline set to 0"
                    );
                }
                if let Some(log) = debug_log {
                    let mut log = log.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    let _ = log.baseline(patch.patch_id, local_idx as u32, cell.baseline());
                }
            }
        }
    }
    st.calibrating = false;
}

impl<D: Device + Send + 'static> Drop for Sensor<D> {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}

impl<D: OpenDevice + Send + 'static> Sensor<D> {
    /// Opens `device_path` and loads the layout file at `layout_path`.
    pub fn init_from_layout(device_path: &str, layout_path: &Path) -> Result<Self> {
        let rows = skin_config::layout::load(layout_path)?;
        let layout = Layout::from_rows(&rows);
        let device = D::open(device_path).map_err(CoreError::DeviceOpen)?;
        Ok(Self::new(device, layout))
    }

    /// Opens `device_path` over a synthetic square-grid layout.
    pub fn init(device_path: &str, num_patches: u32, num_cells: u32) -> Result<Self> {
        let layout = Layout::trivial(num_patches, num_cells);
        let device = D::open(device_path).map_err(CoreError::DeviceOpen)?;
        Ok(Self::new(device, layout))
    }

    /// Opens `device_path` over the canonical 8-patch, 16-cell-per-patch
    /// reference topology.
    pub fn init_octocan(device_path: &str) -> Result<Self> {
        Self::init(device_path, 8, 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockDevice;
    use crate::protocol::encode_record;

    /// The anchor test needs the *next* record's magic byte to confirm the
    /// last real one, so every synthetic stream carries one extra trailing
    /// record purely to anchor the last record that matters to the test.
    fn stream(records: &[(u8, u8, i32)]) -> MockDevice {
        let mut bytes = Vec::new();
        for &(patch, cell, value) in records {
            bytes.extend(encode_record(ProtocolMode::Plain, patch, cell, value, 0));
        }
        bytes.extend(encode_record(ProtocolMode::Plain, 0, 0, 0, 0));
        MockDevice::new(bytes).pad_with_zeros(8192)
    }

    #[test]
    fn cold_start_single_patch_one_frame() {
        let layout = Layout::trivial(1, 16);
        let device = stream(&(0..16).map(|c| (1u8, c as u8, 100 + c)).collect::<Vec<_>>());
        let mut sensor = Sensor::new(device, layout);
        sensor.start().unwrap();
        sensor.wait();

        let values = sensor.patch_state(1).unwrap();
        let expected: Vec<f64> = (0..16).map(|c| (100 + c) as f64).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn double_start_reports_already_started() {
        let layout = Layout::trivial(1, 16);
        let device = stream(&[(1, 0, 1)]);
        let mut sensor = Sensor::new(device, layout);
        sensor.start().unwrap();
        sensor.wait();
        assert!(matches!(sensor.start(), Err(CoreError::AlreadyStarted)));
    }

    #[test]
    fn unknown_address_is_reported_by_address_check() {
        let layout = Layout::trivial(1, 16);
        let device = stream(&[]);
        let sensor = Sensor::new(device, layout);
        assert_eq!(sensor.address_check(2, 0), AddressCheck::PatchUnknown);
        assert_eq!(sensor.address_check(1, 0), AddressCheck::Valid);
    }

    #[test]
    fn set_alpha_rejects_out_of_range() {
        let layout = Layout::trivial(1, 16);
        let device = stream(&[]);
        let mut sensor = Sensor::new(device, layout);
        assert!(sensor.set_alpha(0.0).is_err());
        assert!(sensor.set_alpha(0.5).is_ok());
    }

    #[test]
    fn stop_before_start_is_harmless() {
        let layout = Layout::trivial(1, 16);
        let device = stream(&[]);
        let sensor = Sensor::new(device, layout);
        sensor.stop();
        sensor.stop();
    }

    #[test]
    fn calibrate_end_emits_one_baseline_row_per_cell_to_the_debug_log() {
        let layout = Layout::trivial(1, 2);
        let device = stream(&[]);
        let mut sensor = Sensor::new(device, layout);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.csv");
        sensor.debug_log_stream(&path).unwrap();

        sensor.calibrate_begin();
        sensor.calibrate_end();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(",baseline,1.0="));
        assert!(text.contains(",baseline,1.1="));
    }
}
