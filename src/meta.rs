//! Page metadata: deep merging and `meta.yaml` loading.

use crate::frontmatter::{FrontMatterError, parse_yaml_mapping};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Parse(#[from] FrontMatterError),
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Mappings are merged key-by-key (overlay keys override base keys).
/// - Sequences are concatenated, base items first.
/// - Anything else in the overlay replaces the base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_maps(base, overlay)),
        (Value::Array(mut base), Value::Array(overlay)) => {
            base.extend(overlay);
            Value::Array(base)
        }
        (_, overlay) => overlay,
    }
}

/// [`deep_merge`] for two mappings.
pub fn merge_maps(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, overlay_val) in overlay {
        let merged = match base.remove(&key) {
            Some(base_val) => deep_merge(base_val, overlay_val),
            None => overlay_val,
        };
        base.insert(key, merged);
    }
    base
}

/// Read a metadata file. A missing file is an empty mapping.
pub fn load_meta_file(path: &Path) -> Result<Map<String, Value>, MetaError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(parse_yaml_mapping(&content)?.unwrap_or_default())
}
