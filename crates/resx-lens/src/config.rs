//! Configuration schema for resx-lens
//!
//! Config lives at `.config/resx-lens/config.toml` relative to the project root:
//!
//! ```toml
//! preferred_culture = "fr"
//! text_size = 11.0
//! text_color = "#808080"
//! extension = "resx"
//! exclude = ["**/bin/**", "**/obj/**"]
//! ```

use eyre::{Result, WrapErr};
use resx_lens_core::{AnnotationStyle, DEFAULT_PADDING, RESOURCE_EXTENSION, Rgb};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config path relative to the project root
pub const CONFIG_RELATIVE_PATH: &str = ".config/resx-lens/config.toml";

/// Root configuration for resx-lens
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Culture whose resource files are searched before the neutral ones
    /// (e.g. `"fr"` or `"de-CH"`)
    pub preferred_culture: Option<String>,

    /// Annotation font size; `0` disables annotations
    pub text_size: f64,

    /// Annotation color as `#rrggbb`
    pub text_color: String,

    /// Extension of the resource files to track
    pub extension: String,

    /// Glob patterns (relative to the root) to leave out of discovery
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_culture: None,
            text_size: 11.0,
            text_color: "#808080".to_string(),
            extension: RESOURCE_EXTENSION.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Parse config text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).wrap_err("Invalid resx-lens config")
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).wrap_err_with(|| format!("Config file {} has errors", path.display()))
    }

    /// Annotation style derived from this config
    pub fn style(&self) -> AnnotationStyle {
        let color = Rgb::parse_hex(&self.text_color).unwrap_or_else(|| {
            warn!(
                "Invalid text_color {:?}, using the default",
                self.text_color
            );
            AnnotationStyle::default().color
        });
        AnnotationStyle {
            text_size: self.text_size,
            color,
            padding: DEFAULT_PADDING,
        }
    }
}

/// Default config location for a project root
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_RELATIVE_PATH)
}

/// Load the config, falling back to defaults.
///
/// A missing file is normal and yields the defaults. An unreadable or
/// malformed file also yields the defaults, with the error message returned
/// alongside so callers can surface it.
pub fn load_or_default(path: &Path) -> (Config, Option<String>) {
    match std::fs::read_to_string(path) {
        Ok(content) => match Config::parse(&content) {
            Ok(config) => (config, None),
            Err(e) => {
                let error_msg = format!("Config file {} has errors: {:#}", path.display(), e);
                warn!("{}", error_msg);
                (Config::default(), Some(error_msg))
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "Config file {} not found, using defaults",
                path.display()
            );
            (Config::default(), None)
        }
        Err(e) => {
            let error_msg = format!("Config file {} not readable: {}", path.display(), e);
            warn!("{}", error_msg);
            (Config::default(), Some(error_msg))
        }
    }
}
