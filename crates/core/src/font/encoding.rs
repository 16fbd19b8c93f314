//! Single-byte text encodings for simple fonts.
//!
//! Core and makefont-generated fonts use WinAnsiEncoding (code page 1252).
//! It agrees with Latin-1 everywhere except 0x80-0x9F.

/// Unicode values of cp1252 bytes 0x80-0x9F; `None` marks an unused slot.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Map one character to its cp1252 byte.
pub fn cp1252_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0..=0x7F | 0xA0..=0xFF => Some(code as u8),
        _ => CP1252_HIGH
            .iter()
            .position(|&slot| slot == Some(c))
            .map(|idx| 0x80 + idx as u8),
    }
}

/// Map a cp1252 byte back to its character.
pub fn cp1252_char(b: u8) -> Option<char> {
    match b {
        0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
        _ => Some(b as char),
    }
}

/// Encode `s` to cp1252, substituting `?` for unmappable characters.
pub fn encode_cp1252(s: &str) -> Vec<u8> {
    s.chars().map(|c| cp1252_byte(c).unwrap_or(b'?')).collect()
}

/// Encode `s` byte-per-character for fonts with a built-in encoding
/// (Symbol, ZapfDingbats).
pub fn encode_latin1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
        .collect()
}

/// Decode cp1252 bytes, dropping unused slots.
pub fn decode_cp1252(bytes: &[u8]) -> String {
    bytes.iter().filter_map(|&b| cp1252_char(b)).collect()
}
