//! Error type shared by the collector and the plotter.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    /// The latency histogram capture does not exist. Nothing meaningful can
    /// be produced without samples, so this is never recovered from.
    #[error("latency histogram {} not found", .0.display())]
    HistogramMissing(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("histogram line {line}: {reason}")]
    InvalidHistogram { line: usize, reason: String },

    #[error("invalid latency data: {0}")]
    InvalidLatency(String),

    #[error("dataset has no '{0}' section")]
    MissingSection(&'static str),

    #[error("invalid CPU list '{0}'")]
    InvalidCpuList(String),

    #[error("conflicting values at {path}")]
    MergeConflict { path: String },

    #[error("unsupported output format '{0}' (see --formats)")]
    UnsupportedFormat(String),

    #[error("plotting failed: {0}")]
    Plot(String),
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
