use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;

/// Parser for the settings file.
///
/// Understands the TOML subset quill needs: `[section]` headers,
/// `key = value` pairs, full-line and trailing `#` comments, and string,
/// boolean and integer values. Keys inside a section are stored as
/// `section.key`.
pub struct SettingsParser;

impl SettingsParser {
    /// Parse a settings string into a flat key map
    pub fn parse(content: &str) -> ConfigResult<HashMap<String, SettingValue>> {
        let mut result = HashMap::new();
        let mut current_section = String::new();

        for (index, raw) in content.lines().enumerate() {
            let line_num = index + 1;
            let line = strip_comment(raw).trim();

            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| ConfigError::Parse {
                    line: line_num,
                    message: format!("unterminated section header '{}'", line),
                })?;
                current_section = name.trim().to_string();
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Parse {
                line: line_num,
                message: format!("expected 'key = value', found '{}'", line),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Parse {
                    line: line_num,
                    message: "missing key before '='".to_string(),
                });
            }

            let full_key = if current_section.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", current_section, key)
            };

            let value = Self::parse_value(value.trim()).map_err(|message| ConfigError::Parse {
                line: line_num,
                message,
            })?;
            result.insert(full_key, value);
        }

        Ok(result)
    }

    fn parse_value(value: &str) -> Result<SettingValue, String> {
        if let Some(quoted) = value.strip_prefix('"') {
            let inner = quoted
                .strip_suffix('"')
                .ok_or_else(|| format!("unterminated string {}", value))?;
            return Ok(SettingValue::String(unescape(inner)));
        }

        match value {
            "true" => Ok(SettingValue::Bool(true)),
            "false" => Ok(SettingValue::Bool(false)),
            "" => Err("missing value".to_string()),
            _ => {
                if let Ok(int_val) = value.parse::<i64>() {
                    Ok(SettingValue::Integer(int_val))
                } else if value.contains(char::is_whitespace) || value.contains('"') {
                    Err(format!("unsupported value '{}'", value))
                } else {
                    // Bare words are accepted as strings, e.g. `encoding = latin1`
                    Ok(SettingValue::String(value.to_string()))
                }
            }
        }
    }
}

/// Cut a trailing `#` comment that is not inside a quoted string.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Value types a setting can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    String(String),
    Integer(i64),
    Bool(bool),
}

impl SettingValue {
    /// Get value as string, naming `key` in the error
    pub fn as_str(&self, key: &str) -> ConfigResult<&str> {
        match self {
            SettingValue::String(s) => Ok(s),
            _ => Err(ConfigError::Validation {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }

    /// Get value as boolean, naming `key` in the error
    pub fn as_bool(&self, key: &str) -> ConfigResult<bool> {
        match self {
            SettingValue::Bool(b) => Ok(*b),
            _ => Err(ConfigError::Validation {
                key: key.to_string(),
                expected: "boolean",
            }),
        }
    }

    /// Get value as integer, naming `key` in the error
    pub fn as_integer(&self, key: &str) -> ConfigResult<i64> {
        match self {
            SettingValue::Integer(i) => Ok(*i),
            _ => Err(ConfigError::Validation {
                key: key.to_string(),
                expected: "integer",
            }),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}
