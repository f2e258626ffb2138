//! User configuration: wrapped tool paths, verbosity, and the default
//! entity template.
//!
//! Stored as YAML under the platform configuration directory. A missing
//! file triggers first-run discovery of the wrapped executables.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::discovery;
use crate::error::{Result, RipkitError};
use crate::output::{display_path, Printer};
use crate::tools::lazyripent;

/// Configuration file name inside the config directory.
pub const CONFIG_FILE: &str = "ripkit.yaml";

/// Candidate executable names for the entity-ripping tool, preferred
/// first.
const RIPENT_NAMES: &[&str] = &["Ripent_x64.exe", "Ripent.exe", "ripent"];

/// Candidate executable names for the rule-processing tool.
const LAZYRIPENT_NAMES: &[&str] = &["lazyripent.exe", "lazyripent"];

/// Persistent settings loaded from `ripkit.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the entity-ripping executable.
    pub ripent: Option<PathBuf>,

    /// Path to the rule-processing executable. Absent when discovery
    /// could not find it; rules and the editor are then unavailable.
    pub lazyripent: Option<PathBuf>,

    /// Verbose output from the wrapped tools.
    pub verbose: bool,

    /// Template entity for the editor's Create action. Copied, never
    /// referenced, into each new record.
    pub default_entity: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ripent: None,
            lazyripent: None,
            verbose: false,
            default_entity: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Location of the configuration file, when the platform has a
    /// config directory at all.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ripkit").join(CONFIG_FILE))
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RipkitError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read configuration: {}", e),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| RipkitError::Config {
            message: format!("Invalid configuration: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILE)),
        })
    }

    /// Persist configuration, creating the parent directory as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RipkitError::Io {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        let content = serde_yaml::to_string(self).map_err(|e| RipkitError::Config {
            message: format!("Failed to serialize configuration: {}", e),
            help: None,
        })?;
        fs::write(path, content).map_err(|e| RipkitError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The default-entity template, when one is configured.
    pub fn template(&self) -> Option<&BTreeMap<String, String>> {
        if self.default_entity.is_empty() {
            None
        } else {
            Some(&self.default_entity)
        }
    }

    /// The ripping tool, or the error aborting the requested action.
    pub fn ripent(&self) -> Result<&Path> {
        self.ripent
            .as_deref()
            .ok_or_else(|| RipkitError::ToolNotFound {
                tool: "Ripent".to_string(),
                help: Some("Set the Ripent path in the configuration file".to_string()),
            })
    }

    /// The rule tool, or the error aborting the requested action.
    pub fn lazyripent(&self) -> Result<&Path> {
        self.lazyripent.as_deref().ok_or_else(lazyripent::not_found)
    }

    /// Backfill the stock template when none is configured, so a first
    /// save always leaves a usable Create template behind.
    pub fn ensure_template(&mut self) {
        if self.default_entity.is_empty() {
            self.default_entity = stock_template();
        }
    }

    /// Load the configuration, or run first-run discovery when it does
    /// not exist yet.
    pub fn load_or_discover(printer: &Printer) -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| RipkitError::Config {
            message: "no configuration directory available on this platform".to_string(),
            help: None,
        })?;

        if path.exists() {
            return Self::load(&path);
        }

        printer.info("Setup", "first run, searching for the wrapped tools");

        // The two sweeps are independent; run them concurrently.
        let (ripent, lazyripent) = thread::scope(|scope| {
            let ripent = scope.spawn(|| discovery::find_executable(RIPENT_NAMES));
            let lazyripent = scope.spawn(|| discovery::find_executable(LAZYRIPENT_NAMES));
            (ripent.join().unwrap_or(None), lazyripent.join().unwrap_or(None))
        });

        if ripent.is_none() && lazyripent.is_none() {
            return Err(RipkitError::Config {
                message: "Ripent executable not found".to_string(),
                help: Some(format!(
                    "Set the tool paths manually in {}, or reinstall the SDK and try again",
                    display_path(&path)
                )),
            });
        }

        if let Some(found) = &ripent {
            printer.success("Found", &display_path(found));
        }
        match &lazyripent {
            Some(found) => printer.success("Found", &display_path(found)),
            None => printer.warning(
                "Missing",
                "lazyripent was not found; rules and the editor are disabled",
            ),
        }

        let mut config = Config {
            ripent,
            lazyripent,
            ..Config::default()
        };
        config.ensure_template();
        config.save(&path)?;
        Ok(config)
    }
}

/// The stock Create template written on first save.
fn stock_template() -> BTreeMap<String, String> {
    [
        ("classname", "info_null"),
        ("origin", "0 0 0"),
        ("angles", "0 0 0"),
        ("spawnflags", "0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
