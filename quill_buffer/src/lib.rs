//! # quill_buffer - Buffers and how they reach the disk
//!
//! A [`Buffer`] is a line array with a path, a line ending style and
//! per-buffer settings. Saving goes through one of two paths:
//!
//! - [`Buffer::save`] / [`Buffer::save_as`] normalize the content, encode it
//!   with the configured encoding and overwrite the destination
//! - [`Buffer::save_with_sudo`] / [`Buffer::save_as_with_sudo`] pipe the raw
//!   bytes into an elevated helper instead
//!
//! Both refresh dirty tracking (content hash, or fast-dirty for large files),
//! the on-disk modification time and, with `savecursor`, the per-buffer state
//! kept in a [`StateStore`].

#![warn(clippy::unwrap_used)]

mod buffer;
mod error;
mod hash;
mod interrupt;
mod save;
mod state;
mod sudo;

pub use buffer::{Buffer, BufferKind, Line, Loc};
pub use error::{SaveError, SaveResult};
pub use hash::{ContentHash, LARGE_FILE_THRESHOLD, ParseHashError, calc_hash};
pub use save::{SaveContext, SaveOutcome};
pub use state::{BufferState, StateError, StateResult, StateStore};
