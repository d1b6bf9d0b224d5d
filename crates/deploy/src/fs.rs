//! File system utils.

use std::path::Path;

use anyhow::Context;
use serde::{Serialize, de::DeserializeOwned};

pub struct FsHandler;

impl FsHandler {
    /// Read and deserialize a JSON file.
    pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as JSON", path.display()))
    }

    /// Serialize a value as pretty JSON, creating the parent directory if needed.
    pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", path.display()))?;

        std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(path = %path.display(), "File written");

        Ok(())
    }
}
