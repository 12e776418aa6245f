//! Line ending styles and line splitting.

/// Terminator written between serialized lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Line Feed - \n
    #[default]
    Unix,
    /// Carriage Return + Line Feed - \r\n
    Dos,
}

impl LineEnding {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Unix => b"\n",
            LineEnding::Dos => b"\r\n",
        }
    }
}

/// Detect the predominant line ending in `bytes`.
///
/// Content without any line break is reported as Unix.
pub fn detect_line_ending(bytes: &[u8]) -> LineEnding {
    let mut lf_count = 0u64;
    let mut crlf_count = 0u64;

    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            if i > 0 && bytes[i - 1] == b'\r' {
                crlf_count += 1;
            } else {
                lf_count += 1;
            }
        }
    }

    if crlf_count > lf_count {
        LineEnding::Dos
    } else {
        LineEnding::Unix
    }
}

/// Split content into lines without terminators.
///
/// Always yields at least one (possibly empty) line, so content ending in a
/// newline yields a trailing empty line. For DOS content the `\r` before each
/// `\n` is removed; Unix content keeps stray `\r` bytes untouched.
pub fn split_lines(bytes: &[u8]) -> (Vec<Vec<u8>>, LineEnding) {
    let ending = detect_line_ending(bytes);

    let breaks = bytes.iter().filter(|&&b| b == b'\n').count();

    let lines = bytes
        .split(|&b| b == b'\n')
        .enumerate()
        .map(|(i, line)| match (ending, line.split_last()) {
            (LineEnding::Dos, Some((&b'\r', head))) if i < breaks => head.to_vec(),
            _ => line.to_vec(),
        })
        .collect();

    (lines, ending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_unix() {
        assert_eq!(detect_line_ending(b"line1\nline2\nline3"), LineEnding::Unix);
    }

    #[test]
    fn test_detect_dos() {
        assert_eq!(detect_line_ending(b"line1\r\nline2\r\nline3"), LineEnding::Dos);
    }

    #[test]
    fn test_detect_mixed_prefers_majority() {
        assert_eq!(detect_line_ending(b"a\r\nb\r\nc\nd"), LineEnding::Dos);
        assert_eq!(detect_line_ending(b"a\r\nb\nc\nd"), LineEnding::Unix);
    }

    #[test]
    fn test_detect_no_breaks() {
        assert_eq!(detect_line_ending(b"single"), LineEnding::Unix);
    }

    #[test]
    fn test_split_unix() {
        let (lines, ending) = split_lines(b"a\nb\n");
        assert_eq!(lines, vec![b"a".to_vec(), b"b".to_vec(), Vec::new()]);
        assert_eq!(ending, LineEnding::Unix);
    }

    #[test]
    fn test_split_dos_strips_carriage_returns() {
        let (lines, ending) = split_lines(b"a\r\nb\r\nc");
        assert_eq!(lines, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(ending, LineEnding::Dos);
    }

    #[test]
    fn test_split_empty() {
        let (lines, _) = split_lines(b"");
        assert_eq!(lines, vec![Vec::<u8>::new()]);
    }
}
