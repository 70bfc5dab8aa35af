// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::FacingPreference;
use crate::constants::naming;
use crate::errors::{AppError, AppResult};
use crate::pipelines::document::PageGeometry;
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the per-user configuration directory
const CONFIG_DIR: &str = "campdf";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory exported documents are written to
    pub output_dir: PathBuf,
    /// Prefix of the default session name (`<prefix>-YYYY-MM-DD`)
    pub name_prefix: String,
    /// File name used when the session name is blank
    pub fallback_name: String,
    /// JPEG quality for captured frames
    pub quality: EncodingQuality,
    /// Page size and margin
    pub page: PageGeometry,
    /// Which camera to prefer when several are connected
    pub facing: FacingPreference,
    /// Open the exported PDF with the system viewer
    pub open_after_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: crate::storage::default_output_dir(),
            name_prefix: naming::DEFAULT_PREFIX.to_string(),
            fallback_name: naming::FALLBACK_NAME.to_string(),
            quality: EncodingQuality::default(),
            page: PageGeometry::default(),
            facing: FacingPreference::default(),
            open_after_export: false,
        }
    }
}

impl Config {
    /// `~/.config/campdf/config.json`
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the user configuration, falling back to defaults when there is none
    pub fn load() -> AppResult<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No configuration directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Config = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.page.validate().map_err(AppError::Config)?;

        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }
}
