//! Project configuration for script checking.
//!
//! Controls which order catalogs are registered and how severe the
//! configurable diagnostics are.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! include_builtin: true
//! catalogs:
//!   - catalogs/battle.yml
//! diagnostics:
//!   missing_parameter: error
//!   duplicate_named_parameter: warning
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use orderscript_core::OrderRegistry;
use orderscript_lint::LintOptions;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DocumentError, Result};
use crate::loader::load_catalog;

/// File name looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = ".orderscript.yml";

/// Top-level configuration, loaded from YAML.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// # Examples
///
/// ```
/// use orderscript_document::ScriptConfig;
///
/// let config: ScriptConfig = serde_yaml::from_str("catalogs: [extra.yml]").unwrap();
/// assert!(config.include_builtin);
/// assert_eq!(config.catalogs.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Configuration format version.
    pub version: String,
    /// Register the built-in catalog before any catalog file.
    pub include_builtin: bool,
    /// Catalog files (JSON or YAML), relative to the config file.
    pub catalogs: Vec<PathBuf>,
    /// Severity settings handed to the checker.
    pub diagnostics: LintOptions,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            include_builtin: true,
            catalogs: Vec::new(),
            diagnostics: LintOptions::default(),
        }
    }
}

impl ScriptConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DocumentError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DocumentError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Builds the registry this configuration describes.
    ///
    /// Relative catalog paths are resolved against `base_dir`. The registry
    /// is complete when this returns and should not be changed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidCatalog`] listing every definition
    /// error of the first catalog that fails validation.
    pub fn build_registry(&self, base_dir: &Path) -> Result<OrderRegistry> {
        let mut registry = if self.include_builtin {
            OrderRegistry::with_builtin()
        } else {
            OrderRegistry::new()
        };

        for path in &self.catalogs {
            let path = if path.is_relative() {
                base_dir.join(path)
            } else {
                path.clone()
            };
            let catalog = load_catalog(&path)?;
            let count = registry.register_catalog(catalog).map_err(|errors| {
                DocumentError::InvalidCatalog {
                    path: path.display().to_string(),
                    errors: errors
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; "),
                }
            })?;
            info!(catalog = %path.display(), orders = count, "Registered catalog");
        }

        Ok(registry)
    }
}
