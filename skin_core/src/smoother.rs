//! Per-cell running value: exponential average plus a bounded history
//! (spec.md §4.A).
//!
//! Keeps its own copy of the calibration parameters (baseline, c0, c1, c2)
//! rather than looking them up elsewhere on every `write` — `Profile`
//! (`skin_core::profile`) owns the sparse table of these cells and pushes
//! parameter updates down when a CSV is loaded or `tare()` runs.

/// Evaluate the calibration polynomial. `c1 == 0` marks an uncalibrated
/// cell whose output is suppressed rather than passed through raw.
#[inline]
pub fn scale(raw: i32, baseline: i64, c0: f64, c1: f64, c2: f64) -> f64 {
    if c1 == 0.0 {
        return 0.0;
    }
    let d = (i64::from(raw) - baseline) as f64;
    c0 + d * (c1 + d * c2)
}

/// One cell's calibrated, smoothed signal plus its bounded waveform history.
#[derive(Debug, Clone)]
pub struct Smoother {
    history: Vec<f64>,
    cursor: usize,
    expavg: f64,
    alpha: f64,

    baseline: i64,
    c0: f64,
    c1: f64,
    c2: f64,

    calibrating: bool,
    sum: i64,
    count: u64,
}

impl Smoother {
    /// A freshly-created cell has no profile loaded yet, so it defaults to
    /// the identity polynomial (`c0=0, c1=1, c2=0`) rather than the
    /// suppressed (`c1==0`) state — spec.md §8 scenario 1 requires raw
    /// values to pass through untouched until a profile is loaded.
    pub fn new(capacity: usize, alpha: f64) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        assert!(alpha > 0.0 && alpha <= 1.0, "alpha must be in (0, 1]");
        Self {
            history: vec![0.0; capacity],
            cursor: 0,
            expavg: 0.0,
            alpha,
            baseline: 0,
            c0: 0.0,
            c1: 1.0,
            c2: 0.0,
            calibrating: false,
            sum: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.history.len()
    }

    pub fn expavg(&self) -> f64 {
        self.expavg
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating
    }

    pub fn calibration_params(&self) -> (i64, f64, f64, f64) {
        (self.baseline, self.c0, self.c1, self.c2)
    }

    /// Set the calibration polynomial coefficients without touching
    /// baseline (mirrors `Profile::tare`'s "leave coefficients untouched").
    pub fn set_coefficients(&mut self, c0: f64, c1: f64, c2: f64) {
        self.c0 = c0;
        self.c1 = c1;
        self.c2 = c2;
    }

    pub fn set_baseline(&mut self, baseline: i64) {
        self.baseline = baseline;
    }

    pub fn baseline(&self) -> i64 {
        self.baseline
    }

    /// Reject alpha outside `(0, 1]`; on accept, takes effect from the next
    /// `write`.
    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), &'static str> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err("alpha must be in (0, 1]");
        }
        self.alpha = alpha;
        Ok(())
    }

    /// If a calibration window is open, accumulate `raw` into the running
    /// sum; otherwise calibrate, push into history, and update the
    /// exponential average. Returns the calibrated value when one was
    /// produced.
    pub fn write(&mut self, raw: i32) -> Option<f64> {
        if self.calibrating {
            self.sum += i64::from(raw);
            self.count += 1;
            return None;
        }
        let cal = scale(raw, self.baseline, self.c0, self.c1, self.c2);
        self.history[self.cursor] = cal;
        self.cursor = (self.cursor + 1) % self.history.len();
        self.expavg = self.alpha * cal + (1.0 - self.alpha) * self.expavg;
        Some(cal)
    }

    /// Write the logical history in chronological order into `dst`. `dst`
    /// must have length equal to `capacity()`.
    pub fn snapshot_history(&self, dst: &mut [f64]) {
        assert_eq!(dst.len(), self.history.len());
        let n = self.history.len();
        // Oldest sample is at `cursor` (the next slot to be overwritten).
        for (i, slot) in dst.iter_mut().enumerate() {
            *slot = self.history[(self.cursor + i) % n];
        }
    }

    /// Zero the sum/count, open the calibration window, and zero the
    /// baseline used by `scale` while the window is open.
    pub fn calibrate_begin(&mut self) {
        self.sum = 0;
        self.count = 0;
        self.calibrating = true;
        self.baseline = 0;
    }

    /// Close the calibration window: publish `sum/count` (truncated toward
    /// zero) as the new baseline, or zero it with a caller-visible warning
    /// when no samples were accumulated, then clear the smoothed state.
    ///
    /// Returns `true` when the cell saw at least one sample.
    pub fn calibrate_end(&mut self) -> bool {
        let had_samples = self.count > 0;
        self.baseline = if had_samples {
            self.sum / (self.count as i64)
        } else {
            0
        };
        self.history.iter_mut().for_each(|v| *v = 0.0);
        self.expavg = 0.0;
        self.cursor = 0;
        self.calibrating = false;
        had_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cell_passes_raw_value_through_uncalibrated() {
        let mut s = Smoother::new(4, 1.0);
        assert_eq!(s.write(42), Some(42.0));
        assert_eq!(s.expavg(), 42.0);
    }

    #[test]
    fn c1_zero_suppresses_output() {
        let mut s = Smoother::new(4, 1.0);
        s.set_baseline(10);
        s.set_coefficients(5.0, 0.0, 1.0);
        assert_eq!(s.write(500), Some(0.0));
        assert_eq!(s.expavg(), 0.0);
    }

    #[test]
    fn polynomial_matches_spec_example() {
        // p=1, c=0, baseline=10, c0=2, c1=3, c2=0; raw=14 -> 2 + 4*(3+4*0) = 14
        let mut s = Smoother::new(4, 1.0);
        s.set_baseline(10);
        s.set_coefficients(2.0, 3.0, 0.0);
        assert_eq!(s.write(14), Some(14.0));
    }

    #[test]
    fn alpha_one_tracks_last_sample_exactly() {
        let mut s = Smoother::new(4, 1.0);
        s.set_coefficients(0.0, 1.0, 0.0);
        s.write(10);
        assert_eq!(s.expavg(), 10.0);
        s.write(-3);
        assert_eq!(s.expavg(), -3.0);
    }

    #[test]
    fn small_alpha_converges_without_overshoot() {
        let mut s = Smoother::new(4, 0.05);
        s.set_coefficients(0.0, 1.0, 0.0);
        for _ in 0..500 {
            s.write(100);
            assert!(s.expavg() <= 100.0 + 1e-9);
        }
        assert!((s.expavg() - 100.0).abs() < 0.5);
    }

    #[test]
    fn calibration_window_accumulates_and_baseline_truncates_toward_zero() {
        let mut s = Smoother::new(4, 1.0);
        s.set_coefficients(0.0, 1.0, 0.0);
        s.calibrate_begin();
        for _ in 0..3 {
            assert_eq!(s.write(7), None);
        }
        // sum=21, count=3 -> 21/3 = 7 exactly; also test truncation with 22/3=7
        assert!(s.calibrate_end());
        assert_eq!(s.baseline(), 7);
    }

    #[test]
    fn calibration_end_with_zero_samples_zeros_baseline() {
        let mut s = Smoother::new(4, 1.0);
        s.calibrate_begin();
        assert!(!s.calibrate_end());
        assert_eq!(s.baseline(), 0);
    }

    #[test]
    fn no_write_to_smoothed_state_while_calibrating() {
        let mut s = Smoother::new(4, 1.0);
        s.set_coefficients(0.0, 1.0, 0.0);
        s.write(42);
        let before = s.expavg();
        s.calibrate_begin();
        s.write(999);
        assert_eq!(s.expavg(), before);
    }

    #[test]
    fn set_alpha_rejects_out_of_range() {
        let mut s = Smoother::new(4, 1.0);
        assert!(s.set_alpha(0.0).is_err());
        assert!(s.set_alpha(1.5).is_err());
        assert!(s.set_alpha(0.3).is_ok());
    }

    #[test]
    fn snapshot_history_is_chronological() {
        let mut s = Smoother::new(3, 1.0);
        s.set_coefficients(0.0, 1.0, 0.0);
        for v in [1, 2, 3, 4] {
            s.write(v);
        }
        // history capacity 3, wrote 1,2,3,4 -> overwritten oldest(1) -> [2,3,4]
        let mut dst = [0.0; 3];
        s.snapshot_history(&mut dst);
        assert_eq!(dst, [2.0, 3.0, 4.0]);
    }
}
