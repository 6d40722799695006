use std::time::Duration;

use thiserror::Error;

/// Transport-level failures from a concrete `Device` backend. Every variant
/// converts into a plain `std::io::Error` so callers that only know about
/// `skin_traits::Device` never need to see this type.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open serial device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("device did not become writable within {0:?}")]
    WriteTimeout(Duration),
    #[error(transparent)]
    Transport(#[from] std::io::Error),
}

impl From<DeviceError> for std::io::Error {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Open { source, .. } => source,
            DeviceError::Transport(source) => source,
            DeviceError::WriteTimeout(timeout) => std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("write timed out after {timeout:?}"),
            ),
        }
    }
}
