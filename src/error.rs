// src/error.rs

use thiserror::Error;

/// Everything that can abort a dashboard load.
///
/// Per-field parse problems, empty groups and unknown labels are not here:
/// they degrade to `None` / `Unknown` / `MeanValue::NoData` / the raw code.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("source {url} unavailable: {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("payload is missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("payload could not be read: {0}")]
    Payload(#[from] csv::Error),

    #[error("config {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("unknown age bracket `{0}` (expected one of 0-19, 20-59, 60+)")]
    InvalidAgeBracket(String),

    #[error("building chart frame: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("writing {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
