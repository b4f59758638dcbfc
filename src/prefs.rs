//! Persisted viewport preferences.
//!
//! Small JSON blob on disk; every field has a default so old files and a
//! missing file both deserialize cleanly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    /// Registry name of the camera restored at startup.
    pub defcam: Option<String>,
    /// Arguments passed to the camera factory at restore time.
    pub camargs: Vec<String>,
    pub show_flavor: bool,
    pub shadows: bool,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            defcam: None,
            camargs: Vec::new(),
            show_flavor: true,
            shadows: true,
        }
    }
}

/// Backing store for [`Prefs`]. A store without a path never touches disk,
/// which is what tests and headless sessions use.
#[derive(Debug)]
pub struct PrefStore {
    path: Option<PathBuf>,
    pub vals: Prefs,
}

impl PrefStore {
    pub fn in_memory(vals: Prefs) -> Self {
        Self { path: None, vals }
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let vals = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("parse prefs {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Prefs::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("read prefs {}", path.display()));
            }
        };
        Ok(Self {
            path: Some(path),
            vals,
        })
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&self.vals).context("serialize prefs")?;
        std::fs::write(path, text).with_context(|| format!("write prefs {}", path.display()))
    }
}
