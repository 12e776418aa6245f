//! Line-array buffer consumed by the save path.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use quill_config::{BufferSettings, FileFormat};
use quill_fs::{Encoding, LineEnding};
use tracing::debug;

use crate::error::SaveResult;
use crate::hash::{ContentHash, LARGE_FILE_THRESHOLD, calc_hash};

/// Position in a buffer: `x` counts runes within line `y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Loc {
    pub x: usize,
    pub y: usize,
}

impl Loc {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// One line of raw content, without its terminator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub data: Vec<u8>,
}

impl Line {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Number of runes; invalid bytes count one each
    pub fn rune_count(&self) -> usize {
        self.data.utf8_chunks().map(|c| c.valid().chars().count() + c.invalid().len()).sum()
    }

    /// Byte offset of rune `x`, clamped to the line length
    pub fn byte_offset(&self, x: usize) -> usize {
        let mut seen = 0;
        let mut offset = 0;
        for chunk in self.data.utf8_chunks() {
            for (i, _) in chunk.valid().char_indices() {
                if seen == x {
                    return offset + i;
                }
                seen += 1;
            }
            offset += chunk.valid().len();
            for _ in chunk.invalid() {
                if seen == x {
                    return offset;
                }
                seen += 1;
                offset += 1;
            }
        }
        self.data.len()
    }
}

/// Whether a buffer can be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferKind {
    #[default]
    Default,
    /// In-memory only; every save method refuses it
    Scratch,
}

/// Text buffer as seen by the persistence layer
#[derive(Debug, Clone)]
pub struct Buffer {
    pub(crate) lines: Vec<Line>,
    /// Destination as the user gave it
    pub path: PathBuf,
    /// Destination resolved to an absolute path
    pub abs_path: PathBuf,
    /// Last known modification time of the file on disk
    pub mod_time: Option<SystemTime>,
    /// Terminator written between lines
    pub line_ending: LineEnding,
    pub kind: BufferKind,
    pub settings: BufferSettings,
    pub(crate) is_modified: bool,
    pub(crate) orig_hash: Option<ContentHash>,
    pub(crate) cursors: Vec<Loc>,
    pub(crate) filetype: String,
}

impl Buffer {
    /// An unnamed buffer holding one empty line
    pub fn new(settings: BufferSettings) -> Self {
        Self::from_lines(vec![Line::default()], settings)
    }

    /// A buffer that can never be saved
    pub fn scratch(settings: BufferSettings) -> Self {
        let mut buffer = Self::new(settings);
        buffer.kind = BufferKind::Scratch;
        buffer
    }

    /// A buffer over `lines`; zero lines is allowed
    pub fn from_lines(lines: Vec<Line>, settings: BufferSettings) -> Self {
        let line_ending = match settings.fileformat {
            FileFormat::Unix => LineEnding::Unix,
            FileFormat::Dos => LineEnding::Dos,
        };
        Self::with_line_ending(lines, settings, line_ending)
    }

    /// Dirty tracking is sized with `line_ending`, so it must be final here
    fn with_line_ending(lines: Vec<Line>, settings: BufferSettings, line_ending: LineEnding) -> Self {
        let mut buffer = Self {
            lines,
            path: PathBuf::new(),
            abs_path: PathBuf::new(),
            mod_time: None,
            line_ending,
            kind: BufferKind::Default,
            settings,
            is_modified: false,
            orig_hash: None,
            cursors: vec![Loc::default()],
            filetype: String::new(),
        };
        buffer.init_dirty_tracking();
        buffer.update_rules();
        buffer
    }

    /// A buffer over internal UTF-8 `bytes`; line endings are detected
    pub fn from_bytes(bytes: &[u8], settings: BufferSettings) -> Self {
        let (lines, line_ending) = quill_fs::split_lines(bytes);
        Self::with_line_ending(lines.into_iter().map(Line::new).collect(), settings, line_ending)
    }

    /// Open `path`, decoding it with the configured encoding
    pub fn from_file<P: AsRef<Path>>(path: P, settings: BufferSettings) -> SaveResult<Self> {
        let path = path.as_ref();
        let target = quill_fs::replace_home(path);
        let encoding = Encoding::for_label(&settings.encoding)?;
        let loaded = quill_fs::read_lines(&target, encoding)?;
        debug!(path = %target.display(), size = loaded.size, "loaded file");

        let lines = loaded.lines.into_iter().map(Line::new).collect();
        let mut buffer = Self::with_line_ending(lines, settings, loaded.line_ending);
        buffer.mod_time = Some(loaded.mod_time);
        buffer.set_path(path)?;
        buffer.update_rules();
        Ok(buffer)
    }

    /// Point the buffer at `path` without saving
    pub fn set_path<P: AsRef<Path>>(&mut self, path: P) -> SaveResult<()> {
        let path = path.as_ref();
        let target = quill_fs::replace_home(path);
        let abs_path = quill_fs::absolutize(&target).map_err(|source| {
            crate::error::SaveError::Resolve {
                path: target.clone(),
                source,
            }
        })?;
        self.path = path.to_path_buf();
        self.abs_path = abs_path;
        Ok(())
    }

    pub fn is_scratch(&self) -> bool {
        self.kind == BufferKind::Scratch
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Raw bytes of line `n`
    pub fn line_bytes(&self, n: usize) -> Option<&[u8]> {
        self.lines.get(n).map(|l| l.data.as_slice())
    }

    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(|l| l.data.as_slice())
    }

    /// Serialized size with the current line ending
    pub fn byte_len(&self) -> u64 {
        let content: usize = self.lines.iter().map(|l| l.data.len()).sum();
        let breaks = self.lines.len().saturating_sub(1) * self.line_ending.as_bytes().len();
        (content + breaks) as u64
    }

    /// Whole content joined with the current line ending, no transcoding
    pub fn bytes(&self) -> Vec<u8> {
        let eol = self.line_ending.as_bytes();
        let mut out = Vec::with_capacity(self.byte_len() as usize);
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(eol);
            }
            out.extend_from_slice(&line.data);
        }
        out
    }

    /// File type derived from the path by [`update_rules`](Self::update_rules)
    pub fn filetype(&self) -> &str {
        &self.filetype
    }

    /// Re-derive file-type rules from the current path
    pub fn update_rules(&mut self) {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let filetype = match ext.as_deref() {
            Some("rs") => "rust",
            Some("go") => "go",
            Some("py") => "python",
            Some("c") | Some("h") => "c",
            Some("md") | Some("markdown") => "markdown",
            Some("toml") => "toml",
            Some("sh") | Some("bash") => "shell",
            Some("txt") => "text",
            _ => "unknown",
        };
        self.filetype = filetype.to_string();
    }

    /// Position just past the last rune of the last line
    pub fn end(&self) -> Loc {
        match self.lines.last() {
            Some(line) => Loc::new(line.rune_count(), self.lines.len() - 1),
            None => Loc::default(),
        }
    }

    /// Rune at `loc`; positions past a line's end read as `'\n'`
    pub fn rune_at(&self, loc: Loc) -> char {
        self.lines
            .get(loc.y)
            .and_then(|line| String::from_utf8_lossy(&line.data).chars().nth(loc.x))
            .unwrap_or('\n')
    }

    /// Insert `text` at `loc`; `'\n'` in `text` splits lines
    pub fn insert(&mut self, loc: Loc, text: &str) {
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        let y = loc.y.min(self.lines.len() - 1);
        let offset = self.lines[y].byte_offset(loc.x);
        let tail = self.lines[y].data.split_off(offset);

        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            self.lines[y].data.extend_from_slice(first.as_bytes());
        }
        let mut row = y;
        for piece in pieces {
            row += 1;
            self.lines.insert(row, Line::new(piece.as_bytes()));
        }
        self.lines[row].data.extend_from_slice(&tail);
        self.is_modified = true;
    }

    /// Remove the text between `start` and `end` (exclusive)
    pub fn remove(&mut self, start: Loc, end: Loc) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        if start.y >= self.lines.len() || start == end {
            return;
        }
        let end_y = end.y.min(self.lines.len() - 1);
        let from = self.lines[start.y].byte_offset(start.x);
        let to = self.lines[end_y].byte_offset(end.x);

        if start.y == end_y {
            if from < to {
                self.lines[start.y].data.drain(from..to);
                self.is_modified = true;
            }
            return;
        }

        let tail = self.lines[end_y].data.split_off(to);
        self.lines[start.y].data.truncate(from);
        self.lines[start.y].data.extend_from_slice(&tail);
        self.lines.drain(start.y + 1..=end_y);
        self.is_modified = true;
    }

    pub fn cursors(&self) -> &[Loc] {
        &self.cursors
    }

    /// Move cursor `n`, adding it when `n` is one past the last cursor
    pub fn set_cursor(&mut self, n: usize, loc: Loc) {
        if n < self.cursors.len() {
            self.cursors[n] = loc;
        } else {
            self.cursors.push(loc);
        }
    }

    /// Clamp every cursor onto a valid position after edits
    pub fn relocate_cursors(&mut self) {
        let last_line = self.lines.len().saturating_sub(1);
        for i in 0..self.cursors.len() {
            let y = self.cursors[i].y.min(last_line);
            let max_x = self.lines.get(y).map_or(0, Line::rune_count);
            self.cursors[i] = Loc::new(self.cursors[i].x.min(max_x), y);
        }
    }

    /// Record an edit made outside the editing primitives
    pub fn set_modified(&mut self) {
        self.is_modified = true;
    }

    /// Whether content differs from what was last loaded or saved.
    ///
    /// Compares content hashes unless fast-dirty tracking is on, in which case
    /// the in-memory flag is trusted.
    pub fn modified(&self) -> bool {
        if self.settings.fastdirty {
            return self.is_modified;
        }
        match &self.orig_hash {
            Some(orig) => *orig != calc_hash(self.lines()),
            None => self.is_modified,
        }
    }

    fn init_dirty_tracking(&mut self) {
        if self.settings.fastdirty {
            return;
        }
        if self.byte_len() > LARGE_FILE_THRESHOLD {
            self.settings.fastdirty = true;
        } else {
            self.orig_hash = Some(calc_hash(self.lines()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(text: &str) -> Buffer {
        Buffer::from_bytes(text.as_bytes(), BufferSettings::default())
    }

    #[test]
    fn test_from_bytes_detects_dos() {
        let b = buffer("a\r\nb");
        assert_eq!(b.line_ending, LineEnding::Dos);
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.bytes(), b"a\r\nb");
    }

    #[test]
    fn test_byte_len_counts_terminators() {
        let mut b = buffer("ab\ncd\n");
        assert_eq!(b.byte_len(), 6);
        b.line_ending = LineEnding::Dos;
        assert_eq!(b.byte_len(), 8);
    }

    #[test]
    fn test_rune_offsets() {
        let line = Line::new("h\u{00E9}llo");
        assert_eq!(line.rune_count(), 5);
        assert_eq!(line.byte_offset(2), 3);
        assert_eq!(line.byte_offset(99), line.data.len());
    }

    #[test]
    fn test_insert_splits_lines() {
        let mut b = buffer("hello world");
        b.insert(Loc::new(5, 0), ",\nbig");
        assert_eq!(b.bytes(), b"hello,\nbig world");
        assert!(b.modified());
    }

    #[test]
    fn test_remove_across_lines() {
        let mut b = buffer("one\ntwo\nthree");
        b.remove(Loc::new(1, 0), Loc::new(2, 2));
        assert_eq!(b.bytes(), b"oree");
    }

    #[test]
    fn test_end_and_rune_at() {
        let b = buffer("ab\ncd");
        assert_eq!(b.end(), Loc::new(2, 1));
        assert_eq!(b.rune_at(Loc::new(1, 1)), 'd');
        assert_eq!(b.rune_at(Loc::new(2, 1)), '\n');
    }

    #[test]
    fn test_relocate_cursors_clamps() {
        let mut b = buffer("abc\nd");
        b.set_cursor(0, Loc::new(10, 0));
        b.set_cursor(1, Loc::new(3, 9));
        b.relocate_cursors();
        assert_eq!(b.cursors(), &[Loc::new(3, 0), Loc::new(1, 1)]);
    }

    #[test]
    fn test_hash_tracking_sees_revert() {
        let mut b = buffer("abc");
        b.insert(Loc::new(3, 0), "d");
        assert!(b.modified());
        b.remove(Loc::new(3, 0), Loc::new(4, 0));
        assert!(!b.modified());
    }

    #[test]
    fn test_fastdirty_trusts_flag() {
        let mut settings = BufferSettings::default();
        settings.fastdirty = true;
        let mut b = Buffer::from_bytes(b"abc", settings);
        b.insert(Loc::new(3, 0), "d");
        b.remove(Loc::new(3, 0), Loc::new(4, 0));
        assert!(b.modified());
    }

    #[test]
    fn test_large_content_starts_in_fastdirty() {
        let big = vec![b'x'; LARGE_FILE_THRESHOLD as usize + 1];
        let b = Buffer::from_bytes(&big, BufferSettings::default());
        assert!(b.settings.fastdirty);
        assert!(b.orig_hash.is_none());
    }

    /// One line break short of the threshold with LF, one byte over with CRLF
    fn threshold_straddling(eol: &[u8]) -> Vec<u8> {
        let mut bytes = vec![b'x'; LARGE_FILE_THRESHOLD as usize - 2];
        bytes.extend_from_slice(eol);
        bytes.push(b'y');
        bytes
    }

    #[test]
    fn test_detected_line_ending_sizes_dirty_tracking() {
        let unix = Buffer::from_bytes(&threshold_straddling(b"\n"), BufferSettings::default());
        assert_eq!(unix.byte_len(), LARGE_FILE_THRESHOLD);
        assert!(!unix.settings.fastdirty);
        assert!(unix.orig_hash.is_some());

        let dos = Buffer::from_bytes(&threshold_straddling(b"\r\n"), BufferSettings::default());
        assert_eq!(dos.line_ending, LineEnding::Dos);
        assert_eq!(dos.byte_len(), LARGE_FILE_THRESHOLD + 1);
        assert!(dos.settings.fastdirty);
        assert!(dos.orig_hash.is_none());
    }

    #[test]
    fn test_update_rules_from_extension() {
        let mut b = buffer("");
        b.path = PathBuf::from("src/main.RS");
        b.update_rules();
        assert_eq!(b.filetype(), "rust");
    }
}
