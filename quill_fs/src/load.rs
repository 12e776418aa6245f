//! Read path: on-disk bytes back to internal lines.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::encoding::Encoding;
use crate::eol::{LineEnding, split_lines};
use crate::{FsError, FsResult};

/// A file decoded into internal lines
#[derive(Debug)]
pub struct LoadedFile {
    /// Lines without terminators, internal UTF-8
    pub lines: Vec<Vec<u8>>,
    /// Predominant line ending of the file
    pub line_ending: LineEnding,
    /// Size of the file on disk in bytes
    pub size: u64,
    /// Modification time when read
    pub mod_time: SystemTime,
}

/// Convert on-disk bytes to internal UTF-8.
///
/// UTF-8 input is returned as is. Other encodings are decoded and lose a
/// leading byte-order mark.
pub fn decode_bytes(bytes: &[u8], encoding: Encoding) -> Cow<'_, [u8]> {
    if encoding.is_passthrough() {
        return Cow::Borrowed(bytes);
    }

    let decoded = encoding.decode(bytes);
    let decoded = match decoded.strip_prefix('\u{FEFF}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    };
    Cow::Owned(decoded.into_bytes())
}

/// Read `path` in `encoding` and split it into lines.
pub fn read_lines<P: AsRef<Path>>(path: P, encoding: Encoding) -> FsResult<LoadedFile> {
    let path = path.as_ref();
    let read_err = |source| FsError::Read {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(read_err)?;
    let raw = fs::read(path).map_err(read_err)?;
    let content = decode_bytes(&raw, encoding);
    let (lines, line_ending) = split_lines(&content);

    Ok(LoadedFile {
        lines,
        line_ending,
        size: metadata.len(),
        mod_time: metadata.modified().map_err(read_err)?,
    })
}
