use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::buffer::Buffer;

/// Content size above which hash-based dirty tracking is switched off
pub const LARGE_FILE_THRESHOLD: u64 = 50_000;

/// SHA-256 digest of buffer content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseHashError;

impl fmt::Display for ParseHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected 64 hex digits")
    }
}

impl std::error::Error for ParseHashError {}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 64 || !s.is_ascii() {
            return Err(ParseHashError);
        }
        let mut digest = [0u8; 32];
        for (i, byte) in digest.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| ParseHashError)?;
        }
        Ok(ContentHash(digest))
    }
}

/// Hash lines as if joined by `"\n"`, independent of the on-disk line ending
pub fn calc_hash<'a, I>(lines: I) -> ContentHash
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha256::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(line);
    }
    ContentHash(hasher.finalize().into())
}

impl Buffer {
    /// Digest recorded at the last load or save, if hashing is active
    pub fn orig_hash(&self) -> Option<ContentHash> {
        self.orig_hash
    }

    /// Update dirty tracking after `size` bytes were written.
    ///
    /// Large writes switch the buffer to fast-dirty tracking for good and
    /// report it by returning `true`. Otherwise the baseline hash is taken
    /// from the current content.
    pub(crate) fn refresh_dirty_tracking(&mut self, size: u64) -> bool {
        if self.settings.fastdirty {
            return false;
        }
        if size > LARGE_FILE_THRESHOLD {
            debug!(size, "switching to fast dirty tracking");
            self.settings.fastdirty = true;
            self.orig_hash = None;
            return true;
        }
        self.orig_hash = Some(calc_hash(self.lines()));
        false
    }
}
