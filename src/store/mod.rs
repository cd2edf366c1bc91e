//! JSON-file-backed stores.
//!
//! Keywords and settings live in plain JSON files under the data directory.
//! Reads tolerate missing or corrupt files by degrading to defaults; writes
//! create the directory on demand.

pub mod keywords;
pub mod settings;

use crate::error::Result;
use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tracing::warn;

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring corrupt store file {}: {}", path.display(), err);
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(value).context("serializing store file")?;
    std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
