use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FraError {
    #[error("malformed recording resource: {0}")]
    Format(String),
    #[error("resource for `{stem}` unavailable: {reason}")]
    ResourceUnavailable { stem: String, reason: String },
    #[error("trigger channel has no sample above threshold")]
    EmptyTrigger,
    #[error("tone count mismatch: header declares {declared}, trigger shows {detected}")]
    ToneCountMismatch { declared: usize, detected: usize },
    #[error(
        "stimulus grid inconsistent: {levels} levels x {frequencies} frequencies != {combinations} observed combinations"
    )]
    GridInconsistency {
        levels: usize,
        frequencies: usize,
        combinations: usize,
    },
    #[error("window [{start}, {end}) out of bounds for trace of length {len}")]
    WindowBounds { start: isize, end: isize, len: usize },
    #[error("{strategy} needs at least {required} levels, matrix has {found}")]
    InsufficientLevels {
        strategy: &'static str,
        required: usize,
        found: usize,
    },
    #[error("{strategy} found no active region in the matrix")]
    NoActiveRegion { strategy: &'static str },
    #[error("numerical failure: {0}")]
    Numerical(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Stable, serialisable tag attached to a failed file in the error registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FormatError,
    ResourceUnavailable,
    EmptyTrigger,
    ToneCountMismatch,
    GridInconsistency,
    WindowBoundsError,
    InsufficientData,
    ConfigError,
}

impl FraError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FraError::Format(_) => ErrorCode::FormatError,
            FraError::ResourceUnavailable { .. } => ErrorCode::ResourceUnavailable,
            FraError::EmptyTrigger => ErrorCode::EmptyTrigger,
            FraError::ToneCountMismatch { .. } => ErrorCode::ToneCountMismatch,
            FraError::GridInconsistency { .. } => ErrorCode::GridInconsistency,
            FraError::WindowBounds { .. } => ErrorCode::WindowBoundsError,
            FraError::InsufficientLevels { .. }
            | FraError::NoActiveRegion { .. }
            | FraError::Numerical(_) => ErrorCode::InsufficientData,
            FraError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

impl From<serde_json::Error> for FraError {
    fn from(value: serde_json::Error) -> Self {
        FraError::Format(value.to_string())
    }
}
