//! Quick Start Example
//!
//! Demonstrates the minimal setup for driving the tactile skin sensor
//! pipeline in simulation, with no physical serial port required.

use skin_core::Sensor;
use skin_device::SimulatedSkin;
use std::time::Duration;

/// Runs a simulated streaming session over a single 16-cell patch and
/// prints the patch's smoothed pressure aggregate a few times before
/// stopping the reader.
fn main() -> Result<(), eyre::Report> {
    let device = SimulatedSkin::new(1, 16);
    let mut sensor = Sensor::new(device, skin_core::Layout::trivial(1, 16));

    sensor.start()?;

    for _ in 0..10 {
        std::thread::sleep(Duration::from_millis(100));
        if let Some((magnitude, x, y)) = sensor.patch_pressure(1) {
            println!("patch 1 pressure = {magnitude:.2} @ ({x:.2}, {y:.2})");
        }
    }

    sensor.stop();
    sensor.wait();

    let counters = sensor.counters();
    println!("accepted {} records", counters.accepted);
    Ok(())
}
