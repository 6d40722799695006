//! Console + optional file tracing subscriber setup.
//!
//! Mirrors the ambient logging stack described in SPEC_FULL.md §1:
//! `tracing-subscriber` for the console layer (pretty or JSON), plus an
//! optional non-blocking file appender whose `WorkerGuard` must outlive
//! `main` (stashed in `cli::FILE_GUARD`) or buffered lines are lost on exit.
use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::cli::FILE_GUARD;

/// Installs the global subscriber. `json` selects JSON-formatted console
/// output (stable for log aggregation); `log_file` optionally tees events to
/// an append-only file as plain text regardless of the console format.
pub fn init_tracing(json: bool, log_level: &str, log_file: Option<&Path>) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let file_layer = log_file.and_then(|path| {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty())?;
        let file_name = path.file_name()?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        Some(fmt::layer().with_ansi(false).with_writer(non_blocking))
    });

    let registry = tracing_subscriber::registry().with(filter).with(console);

    if let Some(file_layer) = file_layer {
        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}
