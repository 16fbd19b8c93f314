//! GIF parsing.
//!
//! The first frame is LZW-decoded with `weezl` into an indexed image over
//! the frame's color table; a transparent index from the graphic control
//! extension becomes a color-key mask.

use weezl::{BitOrder, decode::Decoder};

use super::{ColorSpace, ImageInfo, ReadBuffer};
use crate::codec::flate;
use crate::error::{PdfError, Result};

fn truncated() -> PdfError {
    PdfError::Image("truncated GIF buffer".into())
}

fn need(rb: &ReadBuffer<'_>, n: usize) -> Result<()> {
    if rb.remaining() < n {
        return Err(truncated());
    }
    Ok(())
}

/// Concatenate data sub-blocks up to the zero-length terminator.
fn sub_blocks(rb: &mut ReadBuffer<'_>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        need(rb, 1)?;
        let n = rb.u8() as usize;
        if n == 0 {
            return Ok(out);
        }
        need(rb, n)?;
        out.extend_from_slice(rb.next(n));
    }
}

fn color_table(rb: &mut ReadBuffer<'_>, flags: u8) -> Result<Vec<u8>> {
    if flags & 0x80 == 0 {
        return Ok(Vec::new());
    }
    let len = 3 * (1usize << ((flags & 0x07) + 1));
    need(rb, len)?;
    Ok(rb.next(len).to_vec())
}

/// Reorder interlaced rows (passes start at 0, 4, 2, 1 with steps 8, 8, 4, 2).
fn deinterlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    let mut src = 0;
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for y in (start..height).step_by(step) {
            out[y * width..(y + 1) * width]
                .copy_from_slice(&pixels[src * width..(src + 1) * width]);
            src += 1;
        }
    }
    out
}

pub fn parse_gif(data: &[u8]) -> Result<ImageInfo> {
    let mut rb = ReadBuffer::new(data);
    need(&rb, 13)?;
    let signature = rb.next(6);
    if signature != b"GIF87a" && signature != b"GIF89a" {
        return Err(PdfError::Image("not a GIF buffer".into()));
    }
    let _screen_w = rb.u16_le();
    let _screen_h = rb.u16_le();
    let flags = rb.u8();
    let _background = rb.u8();
    let _aspect = rb.u8();
    let global = color_table(&mut rb, flags)?;

    let mut transparent = None;
    loop {
        need(&rb, 1)?;
        match rb.u8() {
            0x21 => {
                need(&rb, 1)?;
                let label = rb.u8();
                let block = sub_blocks(&mut rb)?;
                if label == 0xF9 && block.len() >= 4 && block[0] & 0x01 != 0 {
                    transparent = Some(u32::from(block[3]));
                }
            }
            0x2C => {
                need(&rb, 9)?;
                let _left = rb.u16_le();
                let _top = rb.u16_le();
                let width = rb.u16_le() as usize;
                let height = rb.u16_le() as usize;
                let flags = rb.u8();
                let local = color_table(&mut rb, flags)?;
                need(&rb, 1)?;
                let min_code_size = rb.u8();
                if !(1..=11).contains(&min_code_size) {
                    return Err(PdfError::Image(format!(
                        "invalid LZW code size {min_code_size} in GIF buffer"
                    )));
                }
                let compressed = sub_blocks(&mut rb)?;

                let mut pixels = Vec::with_capacity(width * height);
                let mut decoder = Decoder::new(BitOrder::Lsb, min_code_size);
                let result = decoder.into_vec(&mut pixels).decode(&compressed);
                if let Err(err) = result.status {
                    return Err(PdfError::Image(format!("corrupt GIF image data: {err}")));
                }
                pixels.resize(width * height, 0);
                if flags & 0x40 != 0 {
                    pixels = deinterlace(&pixels, width, height);
                }

                let palette = if local.is_empty() { global } else { local };
                if palette.is_empty() {
                    return Err(PdfError::Image("missing color table in GIF buffer".into()));
                }
                return Ok(ImageInfo {
                    data: flate::compress(&pixels)?.to_vec(),
                    width: width as f64,
                    height: height as f64,
                    color_space: ColorSpace::Indexed,
                    palette,
                    bpc: 8,
                    filter: "FlateDecode".into(),
                    trns: transparent.into_iter().collect(),
                    ..ImageInfo::default()
                });
            }
            0x3B => return Err(PdfError::Image("GIF buffer contains no image".into())),
            other => {
                return Err(PdfError::Image(format!(
                    "unexpected block 0x{other:02x} in GIF buffer"
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weezl::encode::Encoder;

    fn gif(indices: &[u8], width: u16, height: u16, transparent: Option<u8>) -> Vec<u8> {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        // global table of 2 entries
        data.extend_from_slice(&[0x80, 0, 0]);
        data.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        if let Some(idx) = transparent {
            data.extend_from_slice(&[0x21, 0xF9, 4, 0x01, 0, 0, idx, 0]);
        }
        data.push(0x2C);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.push(0);
        data.push(2);
        let packed = Encoder::new(BitOrder::Lsb, 2).encode(indices).unwrap();
        for chunk in packed.chunks(255) {
            data.push(chunk.len() as u8);
            data.extend_from_slice(chunk);
        }
        data.push(0);
        data.push(0x3B);
        data
    }

    #[test]
    fn decodes_indexed_frame() {
        let indices = [0, 1, 1, 0, 1, 0];
        let info = parse_gif(&gif(&indices, 3, 2, Some(1))).unwrap();
        assert_eq!(info.color_space, ColorSpace::Indexed);
        assert_eq!((info.width, info.height), (3.0, 2.0));
        assert_eq!(info.palette.len(), 6);
        assert_eq!(info.trns, vec![1]);
        let pixels = flate::uncompress(&info.data).unwrap();
        assert_eq!(pixels.as_slice(), &indices);
    }

    #[test]
    fn deinterlace_rows() {
        let rows: Vec<u8> = (0..5).collect();
        // pass order for 5 rows: 0, 4, 2, 1, 3
        let out = deinterlace(&[0, 4, 2, 1, 3], 1, 5);
        assert_eq!(out, rows);
    }

    #[test]
    fn rejects_non_gif() {
        assert!(parse_gif(b"GIF90a.......").is_err());
    }
}
