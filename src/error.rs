//! Error types for the highlight pipeline.
//!
//! The diff core itself never fails; errors only come from the edges:
//! spawning diff providers, configuration, and the JSON wire format.

use std::process::ExitStatus;

/// Errors that can occur while producing or exchanging highlights.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Spawning a provider or reading its output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A provider process exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    ProviderFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Encoding or decoding the JSON highlight table failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A serialized `range` was not of the form `"<start> <count>"`.
    #[error("invalid range {0:?}")]
    InvalidRange(String),

    /// A color was not of the form `"r g b a"`.
    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("unknown provider {0:?}")]
    UnknownProvider(String),
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;
