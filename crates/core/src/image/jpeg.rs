//! JPEG parsing: the file is embedded as is under `DCTDecode`; only the
//! frame header is read for dimensions and component count.

use super::{ColorSpace, ImageInfo, ReadBuffer};
use crate::error::{PdfError, Result};

/// Start-of-frame markers (baseline, extended, progressive, lossless and
/// their arithmetic variants). 0xC4, 0xC8 and 0xCC share the range but are
/// not frame headers.
fn is_frame_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

pub fn parse_jpeg(data: &[u8]) -> Result<ImageInfo> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(PdfError::Image("not a JPEG buffer".into()));
    }
    let missing = || PdfError::Image("missing frame header in JPEG buffer".into());

    let mut pos = 2;
    loop {
        if pos + 2 > data.len() {
            return Err(missing());
        }
        if data[pos] != 0xFF {
            return Err(PdfError::Image(format!("invalid JPEG marker at offset {pos}")));
        }
        let marker = data[pos + 1];
        pos += 2;
        match marker {
            0xFF => pos -= 1,
            0x01 | 0xD0..=0xD8 => {}
            0xD9 | 0xDA => return Err(missing()),
            m if is_frame_marker(m) => {
                let mut rb = ReadBuffer::new(&data[pos..]);
                if rb.remaining() < 8 {
                    return Err(missing());
                }
                let _len = rb.u16();
                let _precision = rb.u8();
                let height = rb.u16();
                let width = rb.u16();
                let components = rb.u8();
                let color_space = match components {
                    1 => ColorSpace::DeviceGray,
                    3 => ColorSpace::DeviceRGB,
                    4 => ColorSpace::DeviceCMYK,
                    n => {
                        return Err(PdfError::Image(format!(
                            "image JPEG buffer has unsupported color space ({n} components)"
                        )));
                    }
                };
                return Ok(ImageInfo {
                    data: data.to_vec(),
                    width: f64::from(width),
                    height: f64::from(height),
                    color_space,
                    bpc: 8,
                    filter: "DCTDecode".into(),
                    ..ImageInfo::default()
                });
            }
            _ => {
                if pos + 2 > data.len() {
                    return Err(missing());
                }
                let len = ReadBuffer::new(&data[pos..pos + 2]).u16() as usize;
                pos += len;
            }
        }
    }
}
