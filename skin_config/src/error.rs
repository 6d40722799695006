//! Structured parse errors for the profile CSV and layout text file.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("open profile csv {path:?}: {source}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("profile csv {path:?}: unknown header column {column:?}")]
    UnknownColumn {
        path: std::path::PathBuf,
        column: String,
    },
    #[error("profile csv {path:?} line {line}: {reason}")]
    Row {
        path: std::path::PathBuf,
        line: u64,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("open layout {path:?}: {source}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("layout {path:?} line {line}: {reason}")]
    Row {
        path: std::path::PathBuf,
        line: u64,
        reason: String,
    },
}

pub type ProfileResult<T> = std::result::Result<T, ProfileError>;
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;
