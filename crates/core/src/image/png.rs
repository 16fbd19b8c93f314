//! PNG parsing.
//!
//! The zlib-compressed IDAT stream is embedded unchanged with PNG predictor
//! decode parameters. Gray-alpha and RGBA images are split into a color
//! stream and a soft mask; the row filter bytes stay valid after the split
//! because each channel keeps its neighbours.

use super::{ColorSpace, ImageInfo, ReadBuffer};
use crate::codec::flate;
use crate::error::{PdfError, Result};

const SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

fn truncated() -> PdfError {
    PdfError::Image("truncated PNG buffer".into())
}

fn need(rb: &ReadBuffer<'_>, n: usize) -> Result<()> {
    if rb.remaining() < n {
        return Err(truncated());
    }
    Ok(())
}

/// Parse a PNG image. With `read_dpi`, a `pHYs` chunk in pixels per meter
/// sets the resolution.
pub fn parse_png(data: &[u8], read_dpi: bool) -> Result<ImageInfo> {
    let mut rb = ReadBuffer::new(data);
    need(&rb, 8)?;
    if rb.next(8) != SIGNATURE {
        return Err(PdfError::Image("not a PNG buffer".into()));
    }

    need(&rb, 8 + 13 + 4)?;
    rb.next(4);
    if rb.next(4) != b"IHDR" {
        return Err(PdfError::Image("incorrect PNG buffer".into()));
    }
    let w = rb.u32();
    let h = rb.u32();
    let bpc = rb.u8();
    if bpc > 8 {
        return Err(PdfError::Image("16-bit depth not supported in PNG file".into()));
    }
    let ct = rb.u8();
    let (color_space, colors) = match ct {
        0 | 4 => (ColorSpace::DeviceGray, 1),
        2 | 6 => (ColorSpace::DeviceRGB, 3),
        3 => (ColorSpace::Indexed, 1),
        _ => {
            return Err(PdfError::Image(format!("unknown color type in PNG buffer: {ct}")));
        }
    };
    if rb.u8() != 0 {
        return Err(PdfError::Image("unknown compression method in PNG buffer".into()));
    }
    if rb.u8() != 0 {
        return Err(PdfError::Image("unknown filter method in PNG buffer".into()));
    }
    if rb.u8() != 0 {
        return Err(PdfError::Image("interlacing not supported in PNG buffer".into()));
    }
    rb.next(4);

    let decode_parms = format!(
        "/Predictor 15 /Colors {colors} /BitsPerComponent {bpc} /Columns {w}"
    );

    let mut palette = Vec::new();
    let mut trns = Vec::new();
    let mut idat = Vec::new();
    let mut dpi = None;
    loop {
        need(&rb, 8)?;
        let n = rb.u32() as usize;
        let kind = rb.next(4);
        need(&rb, n.saturating_add(4))?;
        match kind {
            b"PLTE" => palette = rb.next(n).to_vec(),
            b"tRNS" => {
                let t = rb.next(n);
                trns = match ct {
                    0 if t.len() >= 2 => vec![u32::from(t[1])],
                    2 if t.len() >= 6 => vec![u32::from(t[1]), u32::from(t[3]), u32::from(t[5])],
                    0 | 2 => Vec::new(),
                    _ => t
                        .iter()
                        .position(|&b| b == 0)
                        .map(|pos| vec![pos as u32])
                        .unwrap_or_default(),
                };
            }
            b"IDAT" => idat.extend_from_slice(rb.next(n)),
            b"IEND" => break,
            b"pHYs" if n == 9 => {
                let ppu_x = rb.u32();
                let ppu_y = rb.u32();
                let unit = rb.u8();
                if read_dpi && unit == 1 && ppu_x == ppu_y {
                    dpi = Some(f64::from(ppu_x) * 0.0254);
                }
            }
            _ => {
                rb.next(n);
            }
        }
        rb.next(4);
    }

    if color_space == ColorSpace::Indexed && palette.is_empty() {
        return Err(PdfError::Image("missing palette in PNG buffer".into()));
    }

    let mut info = ImageInfo {
        width: f64::from(w),
        height: f64::from(h),
        color_space,
        bpc,
        filter: "FlateDecode".into(),
        decode_parms,
        palette,
        trns,
        ..ImageInfo::default()
    };
    if let Some(dpi) = dpi {
        info.dpi = dpi;
    }

    if ct >= 4 {
        if bpc != 8 {
            return Err(PdfError::Image(format!(
                "unsupported bit depth {bpc} for PNG with alpha channel"
            )));
        }
        let raw = flate::uncompress(&idat)?;
        let (color, alpha) = split_alpha(&raw, w as usize, h as usize, colors)?;
        info.data = flate::compress(&color)?.to_vec();
        info.smask = flate::compress(&alpha)?.to_vec();
    } else {
        info.data = idat;
    }
    Ok(info)
}

/// Split filtered scanlines of `channels` color bytes plus one alpha byte.
fn split_alpha(
    raw: &[u8],
    width: usize,
    height: usize,
    channels: usize,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let row = 1 + width * (channels + 1);
    if raw.len() < row * height {
        return Err(PdfError::Image("truncated PNG image data".into()));
    }
    let mut color = Vec::with_capacity(height * (1 + width * channels));
    let mut alpha = Vec::with_capacity(height * (1 + width));
    for line in raw.chunks_exact(row).take(height) {
        color.push(line[0]);
        alpha.push(line[0]);
        for px in line[1..].chunks_exact(channels + 1) {
            color.extend_from_slice(&px[..channels]);
            alpha.push(px[channels]);
        }
    }
    Ok((color, alpha))
}
