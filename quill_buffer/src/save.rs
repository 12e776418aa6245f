//! Normal save path: normalize, encode, write, then record what was written.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use quill_config::{Config, GlobalSettings};
use quill_fs::Encoding;
use tracing::{debug, info, warn};

use crate::buffer::Buffer;
use crate::error::{SaveError, SaveResult};
use crate::state::StateStore;

/// Editor-wide collaborators a save needs, passed in rather than looked up
#[derive(Debug, Clone, Default)]
pub struct SaveContext {
    global: GlobalSettings,
    state: Option<StateStore>,
}

impl SaveContext {
    pub fn new(global: GlobalSettings) -> Self {
        Self { global, state: None }
    }

    /// Context using the configured helper command and state directory
    pub fn from_config(config: &Config) -> Self {
        Self {
            global: config.global.clone(),
            state: config.state_dir().map(StateStore::new),
        }
    }

    pub fn with_state_store(mut self, store: StateStore) -> Self {
        self.state = Some(store);
        self
    }

    pub fn global(&self) -> &GlobalSettings {
        &self.global
    }

    pub fn state_store(&self) -> Option<&StateStore> {
        self.state.as_ref()
    }
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Absolute path that was written
    pub path: PathBuf,
    /// Bytes handed to the encoder (internal representation)
    pub bytes_written: u64,
    /// Whether this save switched the buffer to fast dirty tracking
    pub fast_dirty_engaged: bool,
}

impl Buffer {
    /// Save to the buffer's current path
    pub fn save(&mut self, ctx: &SaveContext) -> SaveResult<SaveOutcome> {
        if self.is_scratch() {
            return Err(SaveError::Scratch);
        }
        if self.path.as_os_str().is_empty() {
            return Err(SaveError::NoPath);
        }
        let path = self.path.clone();
        self.save_as(ctx, path)
    }

    /// Save to `destination` and make it the buffer's path.
    ///
    /// Modification time and bookkeeping state are refreshed whether or not
    /// the write succeeded; their errors only surface when nothing else failed.
    pub fn save_as<P: AsRef<Path>>(&mut self, ctx: &SaveContext, destination: P) -> SaveResult<SaveOutcome> {
        if self.is_scratch() {
            return Err(SaveError::Scratch);
        }

        self.update_rules();
        self.normalize_for_save();

        let destination = destination.as_ref();
        let target = quill_fs::replace_home(destination);
        let (written, finalized) = match quill_fs::absolutize(&target) {
            Ok(abs_path) => {
                let written = self.write_destination(destination, &abs_path);
                (written, self.finalize_save(ctx, Some(&abs_path)))
            }
            Err(source) => {
                let failed = Err(SaveError::Resolve { path: target, source });
                (failed, self.finalize_save(ctx, None))
            }
        };

        match (written, finalized) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(masked)) => {
                warn!(error = %masked, "bookkeeping failed after an earlier save error");
                Err(e)
            }
        }
    }

    /// Apply `rmtrailingws` and `eofnewline`
    fn normalize_for_save(&mut self) {
        if self.settings.rmtrailingws {
            let mut trimmed = 0usize;
            for line in &mut self.lines {
                let keep = trimmed_len(&line.data);
                if keep < line.data.len() {
                    line.data.truncate(keep);
                    trimmed += 1;
                }
            }
            if trimmed > 0 {
                debug!(lines = trimmed, "trimmed trailing whitespace");
                self.set_modified();
            }
            self.relocate_cursors();
        }

        if self.settings.eofnewline && self.lines.last().is_some_and(|l| !l.data.is_empty()) {
            let end = self.end();
            self.insert(end, "\n");
        }
    }

    fn write_destination(&mut self, destination: &Path, abs_path: &Path) -> SaveResult<SaveOutcome> {
        if let Some(parent) = abs_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if !self.settings.mkparents {
                    return Err(SaveError::MissingParents {
                        path: parent.to_path_buf(),
                    });
                }
                fs::create_dir_all(parent).map_err(|source| SaveError::CreateParents {
                    path: parent.to_path_buf(),
                    source,
                })?;
                debug!(path = %parent.display(), "created parent directories");
            }
        }

        let encoding = Encoding::for_label(&self.settings.encoding)?;
        let eol = self.line_ending.as_bytes();
        let mut size = 0u64;

        quill_fs::overwrite_file(abs_path, encoding, |sink: &mut dyn Write| {
            let mut lines = self.lines.iter();
            let Some(first) = lines.next() else {
                return Ok(());
            };
            sink.write_all(&first.data)?;
            size += first.data.len() as u64;
            for line in lines {
                sink.write_all(eol)?;
                sink.write_all(&line.data)?;
                size += (eol.len() + line.data.len()) as u64;
            }
            Ok(())
        })?;

        let fast_dirty_engaged = self.refresh_dirty_tracking(size);
        if fast_dirty_engaged {
            warn!(size, "file too large for hash tracking, using fast dirty tracking");
        }

        self.path = destination.to_path_buf();
        self.abs_path = abs_path.to_path_buf();
        self.is_modified = false;
        self.update_rules();

        info!(path = %abs_path.display(), size, %encoding, "saved");
        Ok(SaveOutcome {
            path: abs_path.to_path_buf(),
            bytes_written: size,
            fast_dirty_engaged,
        })
    }

    /// Re-read the destination's timestamp and persist bookkeeping state.
    /// Without a resolved destination only the state is persisted.
    pub(crate) fn finalize_save(&mut self, ctx: &SaveContext, abs_path: Option<&Path>) -> SaveResult<()> {
        let mod_time = match abs_path.map(|path| (path, quill_fs::mod_time(path))) {
            None => Ok(()),
            Some((_, Ok(time))) => {
                self.mod_time = Some(time);
                Ok(())
            }
            Some((path, Err(source))) => Err(SaveError::ModTime {
                path: path.to_path_buf(),
                source,
            }),
        };

        let persisted = self.persist_state(ctx);
        match (mod_time, persisted) {
            (Err(e), Err(masked)) => {
                warn!(error = %masked, "could not store buffer state");
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn persist_state(&self, ctx: &SaveContext) -> SaveResult<()> {
        if !self.settings.savecursor || self.abs_path.as_os_str().is_empty() {
            return Ok(());
        }
        if let Some(store) = ctx.state_store() {
            store.persist(&self.capture_state())?;
        }
        Ok(())
    }
}

/// Length of `data` without trailing whitespace
fn trimmed_len(data: &[u8]) -> usize {
    match std::str::from_utf8(data) {
        Ok(text) => text.trim_end().len(),
        Err(_) => data.trim_ascii_end().len(),
    }
}
