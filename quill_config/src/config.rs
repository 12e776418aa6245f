use crate::error::ConfigResult;
use crate::parser::{SettingValue, SettingsParser};
use crate::settings::{BufferSettings, GlobalSettings};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up inside each configuration directory
pub const CONFIG_FILE_NAME: &str = "quill.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Editor-wide settings
    pub global: GlobalSettings,
    /// Defaults applied to every new buffer
    pub buffer: BufferSettings,
    /// Keys outside the known sections, kept for callers that extend the file
    pub custom: HashMap<String, SettingValue>,
}

impl Config {
    /// Load configuration from a settings file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading settings");
        Self::from_toml_str(&content)
    }

    /// Load configuration from a settings string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let values = SettingsParser::parse(content)?;

        Ok(Self {
            global: GlobalSettings::from_values(&values)?,
            buffer: BufferSettings::from_values(&values)?,
            custom: values
                .into_iter()
                .filter(|(k, _)| !k.starts_with("global.") && !k.starts_with("buffer."))
                .collect(),
        })
    }

    /// Configuration directory: `$XDG_CONFIG_HOME/quill`, else `~/.config/quill`
    pub fn config_dir() -> Option<PathBuf> {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(xdg).join("quill"));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("quill"))
    }

    /// Settings file search paths, most specific first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join(".quill.toml"));
        }
        if let Some(dir) = Self::config_dir() {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }
        paths.push(PathBuf::from("/etc/quill").join(CONFIG_FILE_NAME));

        paths
    }

    /// Load configuration with automatic path discovery
    pub fn load() -> ConfigResult<Self> {
        Self::load_with_paths(&Self::config_paths())
    }

    /// Load the first settings file that exists, or defaults when none does
    pub fn load_with_paths(paths: &[PathBuf]) -> ConfigResult<Self> {
        for path in paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        debug!("no settings file found, using defaults");
        Ok(Self::default())
    }

    /// Directory holding per-buffer bookkeeping state
    pub fn state_dir(&self) -> Option<PathBuf> {
        self.global
            .statedir
            .clone()
            .or_else(|| Self::config_dir().map(|dir| dir.join("buffers")))
    }
}
