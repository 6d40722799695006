//! CLI argument definitions and shared statics.
//!
//! Per spec.md §1, argument parsing is out of scope for the core; this
//! surface exists only to host the ambient stack (logging, signal handling,
//! exit codes) and wire the three inputs the facade actually needs (device,
//! layout, profile) to `skin_core::Sensor`.
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "skin", version, about = "Tactile skin sensor driver CLI")]
pub struct Cli {
    /// Serial device path (or simulator identifier when built without the
    /// `hardware` feature).
    #[arg(env = "SKIN_DEVICE", default_value = "/dev/ttyUSB0")]
    pub device: String,

    /// Layout text file (patch count, per-patch cell/xy rows). Without it,
    /// `skin` falls back to the trivial single-patch-16-cell topology.
    #[arg(long, env = "SKIN_LAYOUT", value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Calibration profile CSV (`patch,cell,baseline,c0,c1,c2`).
    #[arg(long, env = "SKIN_PROFILE", value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Cell exponential-average alpha, `(0, 1]`.
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Pressure-aggregate exponential-average alpha, `(0, 1]`.
    #[arg(long = "pressure-alpha", default_value_t = 1.0)]
    pub pressure_alpha: f64,

    /// Append per-frame sample rows to this CSV.
    #[arg(long, value_name = "FILE")]
    pub sample_log: Option<PathBuf>,

    /// Append per-record debug events to this CSV.
    #[arg(long, value_name = "FILE")]
    pub debug_log: Option<PathBuf>,

    /// Emit structured JSON lines instead of pretty text.
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace).
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Tee tracing output to this file in addition to the console.
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream readings until Ctrl-C (or an optional duration elapses),
    /// printing each patch's pressure aggregate as it updates.
    Stream {
        /// Stop automatically after this many milliseconds.
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Print interval in milliseconds.
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
    },
    /// Open a calibration window, wait, then publish baselines from the
    /// accumulated mean.
    Calibrate {
        /// How long to accumulate samples for, in milliseconds.
        #[arg(long, default_value_t = 2000)]
        duration_ms: u64,
    },
    /// Quick health check: open the device, confirm a few frames decode.
    Health {
        /// How long to wait for a first accepted record, in milliseconds.
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
    /// Print one patch's current cell values and pressure aggregate.
    State {
        /// 1-based patch id.
        #[arg(long)]
        patch: u32,
    },
}
