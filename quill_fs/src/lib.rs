//! # quill_fs - Filesystem side of the quill save layer
//!
//! Writes buffer content to disk in the configured text encoding and reads it back.
//!
//! Modules:
//! - `encoding` for the label registry and streaming encoders
//! - `writer` for `overwrite_file`, the encoded create/truncate/write/close sequence
//! - `load` for the read path (decode + line splitting)
//! - `eol` for line ending styles
//! - `path` for home expansion, absolute paths and timestamps

mod encoding;
mod eol;
mod load;
mod path;
mod writer;

pub use encoding::{EncodedWriter, Encoding};
pub use eol::{LineEnding, detect_line_ending, split_lines};
pub use load::{LoadedFile, decode_bytes, read_lines};
pub use path::{absolutize, mod_time, replace_home};
pub use writer::{DEFAULT_FILE_MODE, overwrite_file};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while encoding, writing or reading files
#[derive(Debug, Error)]
pub enum FsError {
    /// The destination could not be opened or created
    #[error("cannot open {} for writing: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Writing content through the encoder failed
    #[error("error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Flushing or closing the destination failed after a clean write
    #[error("error closing {}: {source}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reading a file back failed
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// No encoding is registered under the label
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),
    /// A character has no representation in the target encoding
    #[error("character U+{code:04X} cannot be represented in {encoding}")]
    Unmappable { code: u32, encoding: Encoding },
    /// Any other I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for filesystem operations
pub type FsResult<T> = Result<T, FsError>;
