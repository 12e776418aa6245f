use std::io::{self, Write};

use super::Encoding;

/// Streaming transcoder from internal UTF-8 to a target [`Encoding`].
///
/// Input may be split anywhere, including inside a multi-byte sequence; the
/// incomplete tail is held back until the next write or [`finish`]. UTF-8
/// targets are passed through byte for byte without validation.
///
/// [`finish`]: EncodedWriter::finish
pub struct EncodedWriter<W: Write> {
    inner: W,
    encoding: Encoding,
    pending: Vec<u8>,
    scratch: Vec<u8>,
}

impl<W: Write> EncodedWriter<W> {
    pub fn new(inner: W, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            pending: Vec::with_capacity(4),
            scratch: Vec::new(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Flush any held-back partial sequence (as U+FFFD) and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.pending.is_empty() {
            self.pending.clear();
            let mut out = Vec::new();
            self.encoding
                .encode_char(char::REPLACEMENT_CHARACTER, &mut out)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.inner.write_all(&out)?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn encode_str(&self, s: &str, out: &mut Vec<u8>) -> io::Result<()> {
        for ch in s.chars() {
            self.encoding
                .encode_char(ch, out)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        Ok(())
    }

    /// Encode `input`, leaving an incomplete trailing sequence in `pending`.
    fn encode_chunk(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> io::Result<()> {
        loop {
            match std::str::from_utf8(input) {
                Ok(s) => return self.encode_str(s, out),
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    self.encode_str(&String::from_utf8_lossy(valid), out)?;
                    match err.error_len() {
                        None => {
                            self.pending.extend_from_slice(rest);
                            return Ok(());
                        }
                        Some(bad) => {
                            self.encode_str("\u{FFFD}", out)?;
                            input = &rest[bad..];
                        }
                    }
                }
            }
        }
    }
}

/// Length of the UTF-8 sequence introduced by `lead`.
fn sequence_len(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

impl<W: Write> Write for EncodedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.encoding.is_passthrough() {
            return self.inner.write(buf);
        }

        let mut out = std::mem::take(&mut self.scratch);
        out.clear();
        let mut rest = buf;

        while !self.pending.is_empty() && !rest.is_empty() {
            let mut joined = std::mem::take(&mut self.pending);
            let missing = sequence_len(joined[0]).saturating_sub(joined.len()).max(1);
            let take = missing.min(rest.len());
            joined.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            self.encode_chunk(&joined, &mut out)?;
        }
        if !rest.is_empty() {
            self.encode_chunk(rest, &mut out)?;
        }

        let result = self.inner.write_all(&out);
        self.scratch = out;
        result.map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
