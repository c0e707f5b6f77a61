//! JSON Catalog Writer
//!
//! Layout under the output directory:
//!
//! ```text
//! <dir>/<chain-name>.json         trusted tokens of one chain
//! <dir>/all.json                  trusted tokens keyed by chain id
//! <dir>/observed/<chain-name>.json
//! <dir>/observed/all.json         every merged token (optional)
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::domain::{chain_file_stem, ChainTokens, Classification};
use crate::ports::sink::{CatalogSink, SinkError, WriteSummary};

/// Combined per-set file name
pub const COMBINED_FILE: &str = "all.json";

/// Subdirectory for the all-observed set
pub const OBSERVED_DIR: &str = "observed";

/// Serialize with four-space indentation and a trailing newline.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// File-system [`CatalogSink`]
#[derive(Debug, Clone)]
pub struct JsonCatalogWriter {
    dir: PathBuf,
    write_observed: bool,
}

impl JsonCatalogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_observed: false,
        }
    }

    /// Also write the all-observed set under `observed/`
    pub fn with_observed(mut self, enabled: bool) -> Self {
        self.write_observed = enabled;
        self
    }

    fn write_set(
        &self,
        dir: &Path,
        tokens: &ChainTokens,
        files: &mut Vec<PathBuf>,
    ) -> Result<(), SinkError> {
        fs::create_dir_all(dir).map_err(|source| SinkError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for (chain_id, chain_tokens) in tokens {
            let path = dir.join(format!("{}.json", chain_file_stem(chain_id)));
            write_file(&path, &render_json(chain_tokens)?)?;
            files.push(path);
        }

        let combined = dir.join(COMBINED_FILE);
        write_file(&combined, &render_json(tokens)?)?;
        files.push(combined);

        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    fs::write(path, bytes).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl CatalogSink for JsonCatalogWriter {
    fn write(&self, classification: &Classification) -> Result<WriteSummary, SinkError> {
        let mut files = Vec::new();

        self.write_set(&self.dir, &classification.trusted_tokens, &mut files)?;
        if self.write_observed {
            self.write_set(&self.dir.join(OBSERVED_DIR), &classification.all_tokens, &mut files)?;
        }

        tracing::info!("Wrote {} files to {}", files.len(), self.dir.display());
        Ok(WriteSummary { files })
    }
}
