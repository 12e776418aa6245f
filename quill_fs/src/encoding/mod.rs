use std::fmt;

mod encoder;
mod latin;
mod wide;

pub use encoder::EncodedWriter;

use crate::{FsError, FsResult};

/// On-disk text encodings the save path can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    Latin1,
    Windows1252,
    Latin9,
}

impl Encoding {
    /// Resolve a charset label such as `"utf-8"` or `"latin1"`.
    ///
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn for_label(label: &str) -> FsResult<Encoding> {
        let normalized = label.trim().to_ascii_lowercase();
        let encoding = match normalized.as_str() {
            "utf-8" | "utf8" | "unicode-1-1-utf-8" | "unicode11utf8" | "unicode20utf8" => {
                Encoding::Utf8
            }
            "utf-16" | "utf-16le" | "utf16le" | "ucs-2" | "unicode" | "unicodefeff" => {
                Encoding::Utf16Le
            }
            "utf-16be" | "utf16be" | "unicodefffe" => Encoding::Utf16Be,
            "utf-32" | "utf-32le" | "utf32le" => Encoding::Utf32Le,
            "utf-32be" | "utf32be" => Encoding::Utf32Be,
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" => Encoding::Latin1,
            "windows-1252" | "cp1252" | "x-cp1252" | "ascii" | "us-ascii" | "ansi_x3.4-1968" => {
                Encoding::Windows1252
            }
            "iso-8859-15" | "iso8859-15" | "iso_8859-15" | "latin9" | "l9" | "csisolatin9" => {
                Encoding::Latin9
            }
            _ => return Err(FsError::UnknownEncoding(label.to_string())),
        };
        Ok(encoding)
    }

    /// Canonical label
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf32Le => "utf-32le",
            Encoding::Utf32Be => "utf-32be",
            Encoding::Latin1 => "iso-8859-1",
            Encoding::Windows1252 => "windows-1252",
            Encoding::Latin9 => "iso-8859-15",
        }
    }

    /// Whether internal bytes are written to disk unchanged
    pub fn is_passthrough(self) -> bool {
        self == Encoding::Utf8
    }

    /// Append the encoded form of `ch` to `out`.
    pub(crate) fn encode_char(self, ch: char, out: &mut Vec<u8>) -> FsResult<()> {
        match self {
            Encoding::Utf8 => {
                let mut tmp = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
            }
            Encoding::Utf16Le => wide::encode_utf16(ch, out, false),
            Encoding::Utf16Be => wide::encode_utf16(ch, out, true),
            Encoding::Utf32Le => out.extend_from_slice(&(ch as u32).to_le_bytes()),
            Encoding::Utf32Be => out.extend_from_slice(&(ch as u32).to_be_bytes()),
            Encoding::Latin1 | Encoding::Windows1252 | Encoding::Latin9 => {
                let byte = match self {
                    Encoding::Latin1 => latin::char_to_latin1(ch),
                    Encoding::Windows1252 => latin::char_to_windows1252(ch),
                    _ => latin::char_to_latin9(ch),
                };
                out.push(byte.ok_or(FsError::Unmappable {
                    code: ch as u32,
                    encoding: self,
                })?);
            }
        }
        Ok(())
    }

    /// Decode on-disk bytes into internal UTF-8.
    ///
    /// Malformed input decodes to U+FFFD, matching what the encoder does.
    pub(crate) fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le => wide::decode_utf16(bytes, false),
            Encoding::Utf16Be => wide::decode_utf16(bytes, true),
            Encoding::Utf32Le => wide::decode_utf32(bytes, false),
            Encoding::Utf32Be => wide::decode_utf32(bytes, true),
            Encoding::Latin1 => bytes.iter().map(|&b| latin::latin1_to_char(b)).collect(),
            Encoding::Windows1252 => bytes.iter().map(|&b| latin::windows1252_to_char(b)).collect(),
            Encoding::Latin9 => bytes.iter().map(|&b| latin::latin9_to_char(b)).collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
