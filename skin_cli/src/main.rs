#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! CLI entrypoint for the tactile skin sensor driver.
//!
//! Responsibilities:
//! - Parse the device/layout/profile paths and assemble a `skin_core::Sensor`
//! - Initialize tracing and manage the optional file log sink
//! - Offer `--json` mode emitting structured output (logs still go to stderr)
//! - Install a Ctrl-C handler that raises the shared shutdown flag
//! - Map domain errors to stable exit codes
//!
//! Argument parsing itself is out of scope per spec.md §1; this binary
//! exists to host the ambient stack, not to define a CLI surface.

mod cli;
mod error_fmt;
mod run;
mod tracing_setup;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use tracing_setup::init_tracing;

fn main() -> eyre::Result<()> {
    let _ = color_eyre::install();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nreceived shutdown signal, stopping gracefully...");
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        eprintln!("warning: failed to set signal handler: {e}");
    }

    if let Err(e) = real_main(shutdown) {
        let json = *JSON_MODE.get().unwrap_or(&false);
        let code = exit_code_for_error(&e);
        if json {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(code);
    }
    Ok(())
}

fn real_main(shutdown: Arc<AtomicBool>) -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    init_tracing(cli.json, &cli.log_level, cli.log_file.as_deref());

    run::dispatch(&cli, shutdown)
}
