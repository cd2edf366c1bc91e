//! Server configuration.
//!
//! Defaults first, then an optional TOML file, then `CLIPPER_*` environment
//! overrides. Integration secrets (Naver/Notion keys, Chrome debug address)
//! are not here: they live in the settings store, seeded from their own
//! environment variables.

use crate::error::Result;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Directory holding keywords.json and settings.json.
    pub data_dir: PathBuf,
    /// Directory cafe screenshots are written to.
    pub screenshots_dir: PathBuf,
    /// Base URL prepended to screenshot paths in Notion image blocks.
    /// Screenshots are not served by this process.
    pub public_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            data_dir: PathBuf::from("data"),
            screenshots_dir: PathBuf::from("public/screenshots"),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        if let Ok(bind) = std::env::var("CLIPPER_BIND") {
            config.bind = bind;
        }
        if let Ok(dir) = std::env::var("CLIPPER_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("CLIPPER_SCREENSHOTS_DIR") {
            config.screenshots_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("CLIPPER_PUBLIC_URL") {
            config.public_base_url = url;
        }
        Ok(config)
    }
}
