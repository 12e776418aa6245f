use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use quill_fs::FsError;
use thiserror::Error;

use crate::state::StateError;

/// Errors returned by the save operations
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("cannot save scratch buffer")]
    Scratch,

    #[error("buffer has no file name")]
    NoPath,

    #[error("cannot resolve {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parent dirs of {} don't exist, enable 'mkparents' for auto creation", path.display())]
    MissingParents { path: PathBuf },

    #[error("cannot create parent dirs {}: {source}", path.display())]
    CreateParents {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Encoding lookup, open, write or close failures
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("cannot read modification time of {}: {source}", path.display())]
    ModTime {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot store buffer state: {0}")]
    State(#[from] StateError),

    #[error("cannot start helper runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("cannot intercept interrupts: {0}")]
    Signal(#[source] io::Error),

    #[error("cannot run '{program}': {source}")]
    HelperSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("lost track of '{program}': {source}")]
    HelperWait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot send buffer to '{program}': {source}")]
    HelperInput {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {status}{detail}")]
    HelperFailed {
        program: String,
        status: ExitStatus,
        /// Empty, or `": "` followed by the helper's stderr
        detail: String,
    },

    #[error("'{program}' was interrupted")]
    HelperInterrupted { program: String },
}

pub type SaveResult<T> = Result<T, SaveError>;
