use crate::error::{ConfigError, ConfigResult};
use crate::parser::SettingValue;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Line terminator convention a new buffer starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Unix,
    Dos,
}

impl FileFormat {
    pub fn from_name(key: &str, name: &str) -> ConfigResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "unix" => Ok(FileFormat::Unix),
            "dos" => Ok(FileFormat::Dos),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Unix => write!(f, "unix"),
            FileFormat::Dos => write!(f, "dos"),
        }
    }
}

/// Per-buffer options consumed by the save path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSettings {
    /// Trim trailing whitespace from every line before saving
    pub rmtrailingws: bool,
    /// Make sure the file ends with a newline
    pub eofnewline: bool,
    /// Create missing parent directories of the destination
    pub mkparents: bool,
    /// On-disk text encoding label
    pub encoding: String,
    /// Track dirty state with the in-memory flag instead of content hashes
    pub fastdirty: bool,
    /// Persist cursor and timestamp bookkeeping after each save
    pub savecursor: bool,
    /// Line endings for buffers that were not loaded from a file
    pub fileformat: FileFormat,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            rmtrailingws: false,
            eofnewline: true,
            mkparents: false,
            encoding: "utf-8".to_string(),
            fastdirty: false,
            savecursor: false,
            fileformat: FileFormat::Unix,
        }
    }
}

impl BufferSettings {
    /// Load settings from parsed `buffer.*` values
    pub fn from_values(values: &HashMap<String, SettingValue>) -> ConfigResult<Self> {
        let mut settings = Self::default();

        macro_rules! load_bool {
            ($field:ident, $key:expr) => {
                if let Some(value) = values.get($key) {
                    settings.$field = value.as_bool($key)?;
                }
            };
        }

        load_bool!(rmtrailingws, "buffer.rmtrailingws");
        load_bool!(eofnewline, "buffer.eofnewline");
        load_bool!(mkparents, "buffer.mkparents");
        load_bool!(fastdirty, "buffer.fastdirty");
        load_bool!(savecursor, "buffer.savecursor");

        if let Some(value) = values.get("buffer.encoding") {
            settings.encoding = value.as_str("buffer.encoding")?.to_string();
        }
        if let Some(value) = values.get("buffer.fileformat") {
            let name = value.as_str("buffer.fileformat")?;
            settings.fileformat = FileFormat::from_name("buffer.fileformat", name)?;
        }

        Ok(settings)
    }

    /// Look up an option by its short name, as `set`-style commands do
    pub fn get(&self, key: &str) -> Option<SettingValue> {
        let value: SettingValue = match key {
            "rmtrailingws" => self.rmtrailingws.into(),
            "eofnewline" => self.eofnewline.into(),
            "mkparents" => self.mkparents.into(),
            "fastdirty" => self.fastdirty.into(),
            "savecursor" => self.savecursor.into(),
            "encoding" => SettingValue::String(self.encoding.clone()),
            "fileformat" => SettingValue::String(self.fileformat.to_string()),
            _ => return None,
        };
        Some(value)
    }

    /// Set an option by its short name
    pub fn set(&mut self, key: &str, value: SettingValue) -> ConfigResult<()> {
        match key {
            "rmtrailingws" => self.rmtrailingws = value.as_bool(key)?,
            "eofnewline" => self.eofnewline = value.as_bool(key)?,
            "mkparents" => self.mkparents = value.as_bool(key)?,
            "fastdirty" => self.fastdirty = value.as_bool(key)?,
            "savecursor" => self.savecursor = value.as_bool(key)?,
            "encoding" => self.encoding = value.as_str(key)?.to_string(),
            "fileformat" => self.fileformat = FileFormat::from_name(key, value.as_str(key)?)?,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: format!("{:?}", value),
                });
            }
        }
        Ok(())
    }
}

/// Editor-wide options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Privilege elevation program used by the privileged save path
    pub sucmd: String,
    /// Where per-buffer bookkeeping state is stored
    pub statedir: Option<PathBuf>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            sucmd: "sudo".to_string(),
            statedir: None,
        }
    }
}

impl GlobalSettings {
    /// Load settings from parsed `global.*` values
    pub fn from_values(values: &HashMap<String, SettingValue>) -> ConfigResult<Self> {
        let mut settings = Self::default();

        if let Some(value) = values.get("global.sucmd") {
            let sucmd = value.as_str("global.sucmd")?.trim();
            if sucmd.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "global.sucmd".to_string(),
                    value: String::new(),
                });
            }
            settings.sucmd = sucmd.to_string();
        }
        if let Some(value) = values.get("global.statedir") {
            settings.statedir = Some(PathBuf::from(value.as_str("global.statedir")?));
        }

        Ok(settings)
    }
}
