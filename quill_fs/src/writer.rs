//! Encoded overwrite of a destination file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::encoding::{EncodedWriter, Encoding};
use crate::{FsError, FsResult};

/// Permission bits for newly created files (owner rw, group/other r)
pub const DEFAULT_FILE_MODE: u32 = 0o644;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Open `path` for writing (creating or truncating it), run `write` once
/// against an encoding sink, then close the file.
///
/// The file handle is released on every exit path. When several steps fail,
/// the earliest error wins: an open error, else the error returned by `write`
/// (including encoder errors), else the error raised while flushing and
/// closing.
pub fn overwrite_file<P, F>(path: P, encoding: Encoding, write: F) -> FsResult<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let path = path.as_ref();
    let file = open_for_overwrite(path).map_err(|source| FsError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), %encoding, "opened destination");

    let mut writer = EncodedWriter::new(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file), encoding);

    // Dropping the writer on this path closes the file without reporting
    // close errors, so the callback's error is the one surfaced.
    write(&mut writer).map_err(|source| FsError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    let buffered = writer.finish().map_err(|source| FsError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    close(buffered).map_err(|source| FsError::Close {
        path: path.to_path_buf(),
        source,
    })
}

fn open_for_overwrite(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(DEFAULT_FILE_MODE);
    }

    options.open(path)
}

/// Flush buffered bytes and let the OS report deferred write failures
/// before the handle is dropped.
fn close(buffered: BufWriter<File>) -> io::Result<()> {
    let file = buffered.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}
