//! Single-byte Latin code pages.

/// Windows-1252 code points for bytes 0x80..=0x9F.
///
/// Bytes the code page leaves undefined map to the C1 control with the same value.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Bytes where ISO-8859-15 differs from ISO-8859-1.
const LATIN9_DIFFS: [(u8, char); 8] = [
    (0xA4, '\u{20AC}'),
    (0xA6, '\u{0160}'),
    (0xA8, '\u{0161}'),
    (0xB4, '\u{017D}'),
    (0xB8, '\u{017E}'),
    (0xBC, '\u{0152}'),
    (0xBD, '\u{0153}'),
    (0xBE, '\u{0178}'),
];

pub fn latin1_to_char(byte: u8) -> char {
    char::from(byte)
}

pub fn windows1252_to_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

pub fn latin9_to_char(byte: u8) -> char {
    LATIN9_DIFFS
        .iter()
        .find(|(b, _)| *b == byte)
        .map(|(_, ch)| *ch)
        .unwrap_or(char::from(byte))
}

pub fn char_to_latin1(ch: char) -> Option<u8> {
    u8::try_from(u32::from(ch)).ok()
}

pub fn char_to_windows1252(ch: char) -> Option<u8> {
    if let Some(pos) = WINDOWS_1252_HIGH.iter().position(|&c| c == ch) {
        return u8::try_from(0x80 + pos).ok();
    }
    match u32::from(ch) {
        0x00..=0x7F | 0xA0..=0xFF => u8::try_from(u32::from(ch)).ok(),
        _ => None,
    }
}

pub fn char_to_latin9(ch: char) -> Option<u8> {
    if let Some((byte, _)) = LATIN9_DIFFS.iter().find(|(_, c)| *c == ch) {
        return Some(*byte);
    }
    let byte = char_to_latin1(ch)?;
    // The Latin-1 characters displaced by the euro sign and friends are gone
    if LATIN9_DIFFS.iter().any(|(b, _)| *b == byte) {
        return None;
    }
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_round_trip() {
        for byte in 0u8..=0xFF {
            assert_eq!(char_to_latin1(latin1_to_char(byte)), Some(byte));
        }
    }

    #[test]
    fn test_windows1252_round_trip() {
        for byte in 0u8..=0xFF {
            assert_eq!(char_to_windows1252(windows1252_to_char(byte)), Some(byte));
        }
    }

    #[test]
    fn test_latin9_round_trip() {
        for byte in 0u8..=0xFF {
            assert_eq!(char_to_latin9(latin9_to_char(byte)), Some(byte));
        }
    }

    #[test]
    fn test_latin9_rejects_displaced_characters() {
        // CURRENCY SIGN lives at 0xA4 in Latin-1 only
        assert_eq!(char_to_latin9('\u{00A4}'), None);
        assert_eq!(char_to_latin1('\u{00A4}'), Some(0xA4));
    }

    #[test]
    fn test_encode_copyright() {
        assert_eq!(char_to_latin1('\u{00A9}'), Some(0xA9));
        assert_eq!(char_to_windows1252('\u{00AE}'), Some(0xAE));
        assert_eq!(char_to_windows1252('\u{0100}'), None);
    }
}
