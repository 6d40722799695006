//! Whole-pipeline scenarios driving `Sensor` through a mock device: baseline
//! calibration, resync after stray bytes, shutdown while streaming, and
//! pressure-centroid convergence.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use skin_core::protocol::{encode_record, ProtocolMode, BUFFER_SIZE};
use skin_core::{Layout, Sensor};
use skin_traits::Device;

fn frame_bytes(records: &[(u8, u8, i32)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for &(patch, cell, value) in records {
        bytes.extend(encode_record(ProtocolMode::Plain, patch, cell, value, 0));
    }
    bytes
}

/// The anchor test confirms a record using the *next* record's magic byte,
/// so the last real record of a batch needs one more trailing record behind
/// it purely to supply that byte.
fn with_trailing_anchor(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.extend(encode_record(ProtocolMode::Plain, 0, 0, 0, 0));
    bytes
}

/// Pads `bytes` with zeros to exactly `len`, the size one `FrameReader`
/// refill call reads from the device in one shot.
fn pad_to(mut bytes: Vec<u8>, len: usize) -> Vec<u8> {
    assert!(bytes.len() <= len, "chunk already exceeds refill size");
    bytes.resize(len, 0);
    bytes
}

/// A device fed one byte at a time from the test thread, so a test can hold
/// the reader at an exact point in the stream (e.g. "every calibration
/// sample has been consumed, none of the post-calibration ones have").
///
/// `FrameReader` always refills to its full buffer capacity in one
/// `read_exact` call, and always leaves exactly `record_size` bytes of
/// unconsumed tail behind once it backs off into zero-padding (the anchor
/// test fails one byte at a time until fewer than `record_size + 1` bytes
/// remain). So the first chunk sent must be exactly `BUFFER_SIZE` bytes and
/// every chunk after that exactly `BUFFER_SIZE - record_size` bytes.
struct ChannelDevice {
    rx: mpsc::Receiver<u8>,
}

impl Device for ChannelDevice {
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        for slot in buf.iter_mut() {
            *slot = self
                .rx
                .recv()
                .map_err(|_| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
        }
        Ok(())
    }

    fn write_all(&mut self, _buf: &[u8]) -> std::io::Result<()> {
        Ok(())
    }

    fn poll_writable(&mut self, _timeout: Duration) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Blocks until `sensor`'s accepted counter reaches `target`, or panics after
/// a generous timeout — avoids guessing how long the reader thread needs.
fn wait_for_accepted<D: Device + Send + 'static>(sensor: &Sensor<D>, target: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if sensor.counters().accepted >= target {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {target} accepted records");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn baseline_calibration_then_streaming_converges_on_new_baseline() {
    let record_size = ProtocolMode::Plain.record_size();
    let layout = Layout::trivial(1, 4);
    let (tx, rx) = mpsc::channel();
    let device = ChannelDevice { rx };
    let mut sensor = Sensor::new(device, layout);
    sensor.start().unwrap();
    // Opening the window before any bytes are sent means every sample in
    // the first chunk is guaranteed to land inside it, no race with the
    // reader thread's own startup.
    sensor.calibrate_begin();

    let mut calib_records = Vec::new();
    for _ in 0..5 {
        for cell in 0..4u8 {
            calib_records.push((1u8, cell, 100));
        }
    }
    let chunk1 = pad_to(with_trailing_anchor(frame_bytes(&calib_records)), BUFFER_SIZE);
    for b in chunk1 {
        tx.send(b).unwrap();
    }
    wait_for_accepted(&sensor, 20);
    sensor.calibrate_end();

    let post_records: Vec<(u8, u8, i32)> = (0..4u8).map(|cell| (1u8, cell, 100)).collect();
    let chunk2 = pad_to(
        with_trailing_anchor(frame_bytes(&post_records)),
        BUFFER_SIZE - record_size,
    );
    for b in chunk2 {
        tx.send(b).unwrap();
    }
    wait_for_accepted(&sensor, 24);

    sensor.stop();
    drop(tx);
    sensor.wait();

    let values = sensor.patch_state(1).unwrap();
    for v in values {
        assert!(v.abs() < 1e-6, "expected near-zero after calibration, got {v}");
    }
}

#[test]
fn shutdown_flag_stops_reader_mid_stream() {
    let layout = Layout::trivial(1, 4);
    let (tx, rx) = mpsc::channel();
    let device = ChannelDevice { rx };
    let mut sensor = Sensor::new(device, layout);
    sensor.start().unwrap();

    let feeding = Arc::new(AtomicBool::new(true));
    let feeder = {
        let feeding = feeding.clone();
        std::thread::spawn(move || {
            let bytes = frame_bytes(&[(1, 0, 1), (1, 1, 2), (1, 2, 3), (1, 3, 4)]);
            while feeding.load(Ordering::Relaxed) {
                for &b in &bytes {
                    if tx.send(b).is_err() {
                        return;
                    }
                }
            }
        })
    };

    wait_for_accepted(&sensor, 4);
    sensor.stop();
    sensor.wait();
    feeding.store(false, Ordering::Relaxed);
    let _ = feeder.join();
}

#[test]
fn resync_after_stray_bytes_still_decodes_every_record() {
    let layout = Layout::trivial(1, 4);
    let mut bytes = vec![0xAA, 0xBB, 0xCC];
    let records = with_trailing_anchor(frame_bytes(&[(1, 0, 10), (1, 1, 20), (1, 2, 30), (1, 3, 40)]));
    bytes.extend(records);
    bytes.extend(std::iter::repeat(0u8).take(8192));
    let device = skin_core::mocks::MockDevice::new(bytes);
    let mut sensor = Sensor::new(device, layout);

    sensor.start().unwrap();
    sensor.wait();

    let values = sensor.patch_state(1).unwrap();
    assert_eq!(values, vec![10.0, 20.0, 30.0, 40.0]);
    assert!(sensor.counters().misalignment_events >= 1);
}

#[test]
fn pressure_centroid_pins_to_the_single_loaded_cell() {
    let layout = Layout::trivial(1, 4);
    let mut records = Vec::new();
    for _ in 0..20 {
        records.push((1u8, 0u8, 200));
        records.push((1u8, 1u8, 0));
        records.push((1u8, 2u8, 0));
        records.push((1u8, 3u8, 0));
    }
    let mut bytes = with_trailing_anchor(frame_bytes(&records));
    bytes.extend(std::iter::repeat(0u8).take(8192));
    let device = skin_core::mocks::MockDevice::new(bytes);
    let mut sensor = Sensor::new(device, layout);
    let expected_x = sensor.layout().patch(1).unwrap().x[0];
    let expected_y = sensor.layout().patch(1).unwrap().y[0];

    sensor.start().unwrap();
    sensor.wait();

    // Default cell/pressure alphas are both 1.0 (`Sensor::new`), so the last
    // frame's all-weight-on-cell-0 reading pins the centroid exactly on that
    // cell's coordinates.
    let (magnitude, x, y) = sensor.patch_pressure(1).unwrap();
    assert!(magnitude > 0.0);
    assert!((x - expected_x).abs() < 1e-6);
    assert!((y - expected_y).abs() < 1e-6);
}
