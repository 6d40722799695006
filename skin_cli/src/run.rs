//! Session assembly and command execution: maps parsed CLI arguments onto a
//! `skin_core::Sensor`, then runs whichever subcommand the user picked.
use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use serde_json::json;
use skin_core::Sensor;

use crate::cli::{Cli, Commands};

#[cfg(feature = "hardware")]
type ConcreteDevice = skin_device::SerialDevice;
#[cfg(not(feature = "hardware"))]
type ConcreteDevice = skin_device::SimulatedSkin;

/// Opens the configured device and loads the layout (or falls back to the
/// trivial single-patch topology), then applies the profile and alphas.
fn build_sensor(cli: &Cli) -> eyre::Result<Sensor<ConcreteDevice>> {
    let mut sensor = match &cli.layout {
        Some(path) => Sensor::<ConcreteDevice>::init_from_layout(&cli.device, path)
            .wrap_err_with(|| format!("load layout {path:?}"))?,
        None => Sensor::<ConcreteDevice>::init(&cli.device, 1, 16)
            .wrap_err_with(|| format!("open device {:?}", cli.device))?,
    };

    if let Some(path) = &cli.profile {
        sensor
            .read_profile(path)
            .wrap_err_with(|| format!("load profile {path:?}"))?;
    }
    sensor.set_alpha(cli.alpha).wrap_err("invalid --alpha")?;
    sensor
        .set_pressure_alpha(cli.pressure_alpha)
        .wrap_err("invalid --pressure-alpha")?;

    if let Some(path) = &cli.sample_log {
        sensor
            .log_stream(path)
            .wrap_err_with(|| format!("open sample log {path:?}"))?;
    }
    if let Some(path) = &cli.debug_log {
        sensor
            .debug_log_stream(path)
            .wrap_err_with(|| format!("open debug log {path:?}"))?;
    }
    Ok(sensor)
}

pub fn dispatch(cli: &Cli, shutdown: Arc<AtomicBool>) -> eyre::Result<()> {
    let mut sensor = build_sensor(cli)?;
    match &cli.cmd {
        &Commands::Stream {
            duration_ms,
            interval_ms,
        } => run_stream(&mut sensor, duration_ms, interval_ms, cli.json, shutdown),
        &Commands::Calibrate { duration_ms } => {
            run_calibrate(&mut sensor, duration_ms, cli.json, shutdown)
        }
        &Commands::Health { timeout_ms } => run_health(&mut sensor, timeout_ms, cli.json),
        &Commands::State { patch } => run_state(&sensor, patch, cli.json),
    }
}

fn run_stream(
    sensor: &mut Sensor<ConcreteDevice>,
    duration_ms: Option<u64>,
    interval_ms: u64,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    sensor.start().wrap_err("start reader")?;
    let deadline = duration_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
    let tick = Duration::from_millis(interval_ms.max(1));

    while !shutdown.load(Ordering::Relaxed) {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break;
            }
        }
        std::thread::sleep(tick);
        print_patch_pressures(sensor, json);
    }

    sensor.stop();
    sensor.wait();
    let counters = sensor.counters();
    let rejected = counters.rejected_patch_out_of_range
        + counters.rejected_patch_unknown
        + counters.rejected_cell_out_of_range
        + counters.rejected_cell_unknown;
    tracing::info!(
        accepted = counters.accepted,
        rejected,
        resync_advances = counters.resync_advances,
        "stream stopped"
    );
    Ok(())
}

fn run_calibrate(
    sensor: &mut Sensor<ConcreteDevice>,
    duration_ms: u64,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    sensor.start().wrap_err("start reader")?;
    sensor.calibrate_begin();

    let deadline = Instant::now() + Duration::from_millis(duration_ms);
    while Instant::now() < deadline && !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(20));
    }

    sensor.calibrate_end();
    sensor.stop();
    sensor.wait();

    if json {
        println!("{}", json!({"event": "calibrated", "duration_ms": duration_ms}));
    } else {
        println!("calibration window closed after {duration_ms} ms");
    }
    Ok(())
}

fn run_health(sensor: &mut Sensor<ConcreteDevice>, timeout_ms: u64, json: bool) -> eyre::Result<()> {
    sensor.start().wrap_err("start reader")?;
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let mut ok = false;
    while Instant::now() < deadline {
        if sensor.counters().accepted > 0 {
            ok = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    sensor.stop();
    sensor.wait();

    if json {
        println!("{}", json!({"event": "health", "ok": ok}));
    } else if ok {
        println!("health check: OK (at least one record decoded)");
    } else {
        println!("health check: FAILED (no record decoded within {timeout_ms} ms)");
    }

    if ok {
        Ok(())
    } else {
        Err(eyre::eyre!("health check failed: no record decoded"))
    }
}

fn run_state(sensor: &Sensor<ConcreteDevice>, patch: u32, json: bool) -> eyre::Result<()> {
    let cells = sensor
        .patch_state(patch)
        .ok_or_else(|| eyre::eyre!("unknown patch {patch}"))?;
    let (magnitude, x, y) = sensor.patch_pressure(patch).unwrap_or((0.0, 0.0, 0.0));

    if json {
        println!(
            "{}",
            json!({"patch": patch, "cells": cells, "pressure": {"magnitude": magnitude, "x": x, "y": y}})
        );
    } else {
        println!(
            "{}  pressure=({magnitude:.3}, {x:.3}, {y:.3})",
            skin_ui::format_patch_row(patch, &cells)
        );
    }
    Ok(())
}

fn print_patch_pressures(sensor: &Sensor<ConcreteDevice>, json: bool) {
    let snapshot = sensor.state();
    if json {
        let patches: Vec<_> = snapshot
            .pressure
            .iter()
            .enumerate()
            .map(|(i, &(m, x, y))| json!({"patch": i + 1, "magnitude": m, "x": x, "y": y}))
            .collect();
        println!("{}", json!({"patches": patches}));
        let _ = std::io::stdout().flush();
    } else {
        for (i, &(m, x, y)) in snapshot.pressure.iter().enumerate() {
            print!("p{}: {m:.2}@({x:.2},{y:.2})  ", i + 1);
        }
        println!();
    }
}
