//! Catalog Sink Port
//!
//! Where classified token lists end up (JSON files in production, memory in tests).

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::Classification;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize token list: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a sink produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub files: Vec<PathBuf>,
}

/// Port for persisting a run's classification
pub trait CatalogSink {
    fn write(&self, classification: &Classification) -> Result<WriteSummary, SinkError>;
}
