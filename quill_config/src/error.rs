use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Settings file syntax errors
    #[error("settings parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    /// A known key holds a value of the wrong type
    #[error("option '{key}' expects a {expected} value")]
    Validation { key: String, expected: &'static str },
    /// A value of the right type that is not accepted for the key
    #[error("option '{key}' does not accept '{value}'")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
