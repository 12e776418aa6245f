//! UTF-16 and UTF-32 in either byte order.

pub fn encode_utf16(ch: char, out: &mut Vec<u8>, big_endian: bool) {
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        let bytes = if big_endian {
            unit.to_be_bytes()
        } else {
            unit.to_le_bytes()
        };
        out.extend_from_slice(&bytes);
    }
}

pub fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let units = bytes.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if big_endian {
            u16::from_be_bytes(pair)
        } else {
            u16::from_le_bytes(pair)
        }
    });

    let mut result: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if bytes.len() % 2 != 0 {
        result.push(char::REPLACEMENT_CHARACTER);
    }
    result
}

pub fn decode_utf32(bytes: &[u8], big_endian: bool) -> String {
    let chunks = bytes.chunks_exact(4);
    let has_tail = !chunks.remainder().is_empty();

    let mut result: String = chunks
        .map(|quad| {
            let quad = [quad[0], quad[1], quad[2], quad[3]];
            let code = if big_endian {
                u32::from_be_bytes(quad)
            } else {
                u32::from_le_bytes(quad)
            };
            char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();
    if has_tail {
        result.push(char::REPLACEMENT_CHARACTER);
    }
    result
}
