//! Domain errors for the acquisition pipeline (spec.md §7).
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("device open failed: {0}")]
    DeviceOpen(#[source] std::io::Error),
    #[error("device read/write failed: {0}")]
    DeviceFatal(#[source] std::io::Error),
    #[error("log file open failed: {0}")]
    LogOpen(#[source] std::io::Error),
    #[error("profile load failed: {0}")]
    ProfileLoad(#[from] crate::profile::ProfileLoadError),
    #[error("profile csv error: {0}")]
    ProfileCsv(#[from] skin_config::ProfileError),
    #[error("layout file error: {0}")]
    Layout(#[from] skin_config::LayoutError),
    #[error("sensor already started")]
    AlreadyStarted,
    #[error("sensor not started")]
    NotStarted,
    #[error("alpha must be in (0, 1]")]
    InvalidAlpha,
}

pub type Result<T> = std::result::Result<T, CoreError>;
