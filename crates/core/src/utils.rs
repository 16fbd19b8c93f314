//! Geometry types and PDF string helpers shared across the crate.

use serde::{Deserialize, Serialize};

/// A point in user units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width / height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub wd: f64,
    pub ht: f64,
}

impl Size {
    pub const fn new(wd: f64, ht: f64) -> Self {
        Self { wd, ht }
    }

    /// Return the size with width and height exchanged.
    pub fn swapped(self) -> Self {
        Self {
            wd: self.ht,
            ht: self.wd,
        }
    }

    /// Ratio of width to height.
    pub fn aspect_ratio(self) -> f64 {
        self.wd / self.ht
    }
}

/// Escape a byte string for use inside a PDF literal string `( ... )`.
pub fn escape(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 8);
    for &b in s {
        match b {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(b),
        }
    }
    out
}

/// Encode `s` as UTF-16BE, optionally preceded by the byte order mark.
pub fn utf8_to_utf16(s: &str, with_bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + 2 * s.len());
    if with_bom {
        out.extend_from_slice(&[0xFE, 0xFF]);
    }
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Replace every occurrence of `from` with `to`.
pub fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() || haystack.len() < from.len() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

/// Whether `needle` occurs in `haystack`.
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Lower-case SHA-1 hex digest.
pub fn sha1_hex(data: &[u8]) -> String {
    use sha1::{Digest, Sha1};
    format!("{:x}", Sha1::digest(data))
}
