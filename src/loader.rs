use crate::drift::ResourceCollection;
use crate::traits::FileSystem;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load a resource collection (`{"resources": [...]}`) from a JSON file
pub fn load_collection(fs: &dyn FileSystem, path: &Path) -> Result<ResourceCollection> {
    let content = fs.read_to_string(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse resource collection: {}", path.display()))
}

/// Load any JSON document, such as a previously written report
pub fn load_json(fs: &dyn FileSystem, path: &Path) -> Result<Value> {
    let content = fs.read_to_string(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))
}
