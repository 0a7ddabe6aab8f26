use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("hourly series must have 24 entries, got {len}")]
    SeriesLength { len: usize },

    #[error("unknown route: {id}")]
    UnknownRoute { id: String },

    #[error("invalid dataset: {message}")]
    InvalidDataset { message: String },

    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetricsError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::InvalidDataset {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_route(id: impl Into<String>) -> Self {
        Self::UnknownRoute { id: id.into() }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
