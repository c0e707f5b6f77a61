//! Output Adapter
//!
//! Writes classified token lists to disk as JSON files.

mod writer;

pub use writer::{render_json, JsonCatalogWriter, COMBINED_FILE, OBSERVED_DIR};
