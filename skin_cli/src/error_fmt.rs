//! Human-readable error descriptions and structured JSON error formatting.
use serde_json::json;
use skin_core::CoreError;

/// Map an `eyre::Report` to a human-readable explanation with likely causes
/// and a fix hint, following the error-kind table in spec.md §7.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::DeviceOpen(source) => format!(
                "What happened: failed to open the sensor device.\nLikely causes: wrong path, permissions, or the device is not attached.\nHow to fix: check the device path / $SKIN_DEVICE and permissions on the port. Cause: {source}"
            ),
            CoreError::DeviceFatal(source) => format!(
                "What happened: the device stopped responding mid-stream.\nLikely causes: the serial link was unplugged or the firmware reset.\nHow to fix: reconnect the sensor and restart streaming. Cause: {source}"
            ),
            CoreError::LogOpen(source) => format!(
                "What happened: failed to open a log file.\nLikely causes: the parent directory does not exist or is not writable.\nHow to fix: check --sample-log/--debug-log paths. Cause: {source}"
            ),
            CoreError::ProfileLoad(e) => format!(
                "What happened: calibration profile has a cell id out of range.\nLikely causes: a stale profile CSV from a different sensor layout.\nHow to fix: regenerate the profile for the current layout. Cause: {e}"
            ),
            CoreError::ProfileCsv(e) => format!(
                "What happened: calibration profile CSV failed to parse.\nLikely causes: missing/renamed header column, or a malformed row.\nHow to fix: check the file against the documented `patch,cell,baseline,c0,c1,c2` header. Cause: {e}"
            ),
            CoreError::Layout(e) => format!(
                "What happened: layout file failed to parse.\nLikely causes: wrong patch/cell counts or a malformed row.\nHow to fix: regenerate the layout file. Cause: {e}"
            ),
            CoreError::AlreadyStarted => {
                "What happened: the sensor was already started.\nHow to fix: this indicates a double `start`; please report it as a bug.".to_string()
            }
            CoreError::NotStarted => {
                "What happened: an operation needed a running reader but none was active.\nHow to fix: start streaming before issuing this command.".to_string()
            }
            CoreError::InvalidAlpha => {
                "What happened: an alpha value was outside (0, 1].\nHow to fix: pick a value greater than 0 and at most 1.".to_string()
            }
        };
    }

    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per spec.md §7's error-kind table: configuration and
/// device-fatal errors get distinct codes so scripts can branch on them;
/// everything else is a generic failure.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::DeviceOpen(_) | CoreError::DeviceFatal(_) => 2,
            CoreError::ProfileLoad(_) | CoreError::ProfileCsv(_) | CoreError::Layout(_) => 3,
            CoreError::InvalidAlpha => 4,
            CoreError::AlreadyStarted | CoreError::NotStarted | CoreError::LogOpen(_) => 5,
        };
    }
    1
}

/// Structured JSON for errors when `--json` is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    let reason = if let Some(ce) = err.downcast_ref::<CoreError>() {
        match ce {
            CoreError::DeviceOpen(_) => "DeviceOpen",
            CoreError::DeviceFatal(_) => "DeviceFatal",
            CoreError::LogOpen(_) => "LogOpen",
            CoreError::ProfileLoad(_) => "ProfileLoad",
            CoreError::ProfileCsv(_) => "ProfileCsv",
            CoreError::Layout(_) => "Layout",
            CoreError::AlreadyStarted => "AlreadyStarted",
            CoreError::NotStarted => "NotStarted",
            CoreError::InvalidAlpha => "InvalidAlpha",
        }
    } else {
        "Error"
    };
    json!({"reason": reason, "message": humanize(err)}).to_string()
}
