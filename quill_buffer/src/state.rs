//! Per-buffer bookkeeping kept between sessions.
//!
//! Each saved buffer gets one small `key=value` file under the state
//! directory, named after the buffer's absolute path with separators escaped.
//! The file records the cursor, the modification time seen at save, and the
//! content digest, so reopening an unchanged file can put the cursor back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, trace};

use crate::buffer::{Buffer, Loc};
use crate::hash::ContentHash;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed state file {}, line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("buffer has no absolute path")]
    Path,
}

pub type StateResult<T> = Result<T, StateError>;

/// Snapshot written after a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferState {
    pub path: PathBuf,
    pub cursor: Loc,
    pub mod_time: Option<SystemTime>,
    pub content_hash: Option<ContentHash>,
    /// Seconds since the epoch when the snapshot was taken
    pub timestamp: u64,
}

impl BufferState {
    fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("timestamp={}\n", self.timestamp));
        out.push_str(&format!("path={}\n", self.path.display()));
        out.push_str(&format!("cursor={},{}\n", self.cursor.y, self.cursor.x));
        match self.mod_time.and_then(|t| t.duration_since(UNIX_EPOCH).ok()) {
            Some(d) => out.push_str(&format!("modtime={}.{:09}\n", d.as_secs(), d.subsec_nanos())),
            None => out.push_str("modtime=\n"),
        }
        match &self.content_hash {
            Some(hash) => out.push_str(&format!("hash={hash}\n")),
            None => out.push_str("hash=\n"),
        }
        out
    }

    fn deserialize(file: &Path, data: &str) -> StateResult<Self> {
        let mut state = BufferState {
            path: PathBuf::new(),
            cursor: Loc::default(),
            mod_time: None,
            content_hash: None,
            timestamp: 0,
        };

        for (idx, line) in data.lines().enumerate() {
            let line_no = idx + 1;
            let parse_err = |message: &str| StateError::Parse {
                path: file.to_path_buf(),
                line: line_no,
                message: message.to_string(),
            };

            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_err("expected key=value"));
            };

            match key {
                "timestamp" => {
                    state.timestamp = value.parse().map_err(|_| parse_err("bad timestamp"))?;
                }
                "path" => state.path = PathBuf::from(value),
                "cursor" => {
                    let (y, x) = value.split_once(',').ok_or_else(|| parse_err("bad cursor"))?;
                    let y = y.parse().map_err(|_| parse_err("bad cursor line"))?;
                    let x = x.parse().map_err(|_| parse_err("bad cursor column"))?;
                    state.cursor = Loc::new(x, y);
                }
                "modtime" if value.is_empty() => state.mod_time = None,
                "modtime" => {
                    let (secs, nanos) = value.split_once('.').unwrap_or((value, "0"));
                    let secs: u64 = secs.parse().map_err(|_| parse_err("bad modtime"))?;
                    let nanos: u32 = nanos.parse().map_err(|_| parse_err("bad modtime"))?;
                    state.mod_time = Some(UNIX_EPOCH + Duration::new(secs, nanos));
                }
                "hash" if value.is_empty() => state.content_hash = None,
                "hash" => {
                    state.content_hash = Some(value.parse().map_err(|_| parse_err("bad hash"))?);
                }
                // Unknown keys are left for newer versions
                _ => trace!(key, "ignoring unknown state key"),
            }
        }

        Ok(state)
    }
}

/// Directory of [`BufferState`] files
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the state for `abs_path`
    pub fn state_path(&self, abs_path: &Path) -> PathBuf {
        let escaped: String = abs_path
            .to_string_lossy()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '%',
                other => other,
            })
            .collect();
        self.dir.join(escaped)
    }

    /// Write `state`, replacing any previous snapshot for the same file
    pub fn persist(&self, state: &BufferState) -> StateResult<PathBuf> {
        if state.path.as_os_str().is_empty() {
            return Err(StateError::Path);
        }
        fs::create_dir_all(&self.dir)?;

        let state_path = self.state_path(&state.path);
        let temp_path = state_path.with_extension("tmp");
        fs::write(&temp_path, state.serialize())?;
        fs::rename(&temp_path, &state_path)?;

        debug!(path = %state_path.display(), "stored buffer state");
        Ok(state_path)
    }

    /// Snapshot for `abs_path`, or `None` when nothing was stored
    pub fn restore(&self, abs_path: &Path) -> StateResult<Option<BufferState>> {
        let state_path = self.state_path(abs_path);
        let data = match fs::read_to_string(&state_path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        BufferState::deserialize(&state_path, &data).map(Some)
    }

    /// Forget the snapshot for `abs_path`
    pub fn remove(&self, abs_path: &Path) -> StateResult<()> {
        match fs::remove_file(self.state_path(abs_path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Buffer {
    /// Bookkeeping snapshot of the buffer as it is now
    pub fn capture_state(&self) -> BufferState {
        BufferState {
            path: self.abs_path.clone(),
            cursor: self.cursors.first().copied().unwrap_or_default(),
            mod_time: self.mod_time,
            content_hash: self.orig_hash,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Put the cursor back if `state` describes the file as currently loaded.
    ///
    /// Returns whether the snapshot was applied.
    pub fn apply_state(&mut self, state: &BufferState) -> bool {
        if state.path != self.abs_path || state.mod_time.is_none() || state.mod_time != self.mod_time {
            return false;
        }
        self.set_cursor(0, state.cursor);
        self.relocate_cursors();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_config::BufferSettings;

    fn sample(path: &str) -> BufferState {
        BufferState {
            path: PathBuf::from(path),
            cursor: Loc::new(4, 2),
            mod_time: Some(UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789)),
            content_hash: Some(crate::hash::calc_hash([b"x".as_slice()])),
            timestamp: 42,
        }
    }

    #[test]
    fn test_persist_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("buffers"));
        let state = sample("/home/user/notes.txt");

        let written = store.persist(&state).unwrap();
        assert_eq!(written.file_name().unwrap(), "%home%user%notes.txt");
        assert!(!written.with_extension("tmp").exists());

        let restored = store.restore(Path::new("/home/user/notes.txt")).unwrap();
        assert_eq!(restored, Some(state));
    }

    #[test]
    fn test_restore_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert_eq!(store.restore(Path::new("/nope")).unwrap(), None);
        store.remove(Path::new("/nope")).unwrap();
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        fs::write(store.state_path(Path::new("/f")), "timestamp=1\ncursor=a,b\n").unwrap();

        match store.restore(Path::new("/f")) {
            Err(StateError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_persist_needs_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(matches!(store.persist(&sample("")), Err(StateError::Path)));
    }

    #[test]
    fn test_apply_state_requires_matching_mod_time() {
        let mut buffer = Buffer::from_bytes(b"one\ntwo\nthree four", BufferSettings::default());
        buffer.abs_path = PathBuf::from("/tmp/f.txt");
        let state = sample("/tmp/f.txt");

        assert!(!buffer.apply_state(&state));
        assert_eq!(buffer.cursors()[0], Loc::default());

        buffer.mod_time = state.mod_time;
        assert!(buffer.apply_state(&state));
        assert_eq!(buffer.cursors()[0], Loc::new(4, 2));
    }
}
