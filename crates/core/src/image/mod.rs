//! Raster images: parsing PNG, JPEG and GIF into embeddable XObject data.
//!
//! Each parser produces an [`ImageInfo`] holding the stream bytes, the filter
//! and decode parameters to declare, and any transparency information. The
//! image identity is the SHA-1 of its data, so identical images registered
//! under different names are written to the file once.

pub mod gif;
pub mod jpeg;
pub mod png;
pub mod rbuf;

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PdfError, Result};
use crate::utils::sha1_hex;

pub use rbuf::ReadBuffer;

/// Supported image encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
}

impl ImageType {
    /// Infer the type from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                PdfError::Image(format!(
                    "image file has no extension and no type was specified: {}",
                    path.display()
                ))
            })?;
        ext.parse()
    }
}

impl FromStr for ImageType {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageType::Png),
            "jpg" | "jpeg" => Ok(ImageType::Jpeg),
            "gif" => Ok(ImageType::Gif),
            other => Err(PdfError::UnsupportedImageType(other.to_string())),
        }
    }
}

/// Options for registering an image.
#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    /// Image type; inferred from the file extension when `None`.
    pub image_type: Option<ImageType>,
    /// Use the resolution stored in a PNG `pHYs` chunk.
    pub read_dpi: bool,
    /// Place the image at a negative x instead of the current x.
    pub allow_negative_position: bool,
}

/// Color space of an image XObject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    #[default]
    DeviceRGB,
    DeviceGray,
    DeviceCMYK,
    Indexed,
}

impl ColorSpace {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
            ColorSpace::Indexed => "Indexed",
        }
    }
}

/// A parsed image ready to be written as an XObject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub(crate) data: Vec<u8>,
    pub(crate) smask: Vec<u8>,
    pub(crate) id: String,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) color_space: ColorSpace,
    pub(crate) palette: Vec<u8>,
    pub(crate) bpc: u8,
    pub(crate) filter: String,
    pub(crate) decode_parms: String,
    pub(crate) trns: Vec<u32>,
    pub(crate) dpi: f64,
}

impl Default for ImageInfo {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            smask: Vec::new(),
            id: String::new(),
            width: 0.0,
            height: 0.0,
            color_space: ColorSpace::default(),
            palette: Vec::new(),
            bpc: 8,
            filter: String::new(),
            decode_parms: String::new(),
            trns: Vec::new(),
            dpi: 72.0,
        }
    }
}

impl ImageInfo {
    /// Content identifier, used in the `/I{id}` resource name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    pub fn set_dpi(&mut self, dpi: f64) {
        self.dpi = dpi;
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn bits_per_component(&self) -> u8 {
        self.bpc
    }

    /// Whether the image carries an alpha channel as a soft mask.
    pub fn has_soft_mask(&self) -> bool {
        !self.smask.is_empty()
    }

    /// Color-key mask values, one per color component.
    pub fn transparency(&self) -> &[u32] {
        &self.trns
    }

    /// Size in user units at the image's resolution, for scale factor `k`.
    pub fn extent(&self, k: f64) -> (f64, f64) {
        let scale = k * self.dpi / 72.0;
        (self.width / scale, self.height / scale)
    }

    fn finish(mut self) -> Self {
        let mut keyed = Vec::with_capacity(self.data.len() + self.smask.len());
        keyed.extend_from_slice(&self.data);
        keyed.extend_from_slice(&self.smask);
        self.id = sha1_hex(&keyed);
        self
    }
}

/// Parse an image of the given type from a reader.
pub fn parse_image(
    image_type: ImageType,
    mut reader: impl Read,
    read_dpi: bool,
) -> Result<ImageInfo> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_image_bytes(image_type, &data, read_dpi)
}

/// Parse an in-memory image of the given type.
pub fn parse_image_bytes(image_type: ImageType, data: &[u8], read_dpi: bool) -> Result<ImageInfo> {
    let info = match image_type {
        ImageType::Png => png::parse_png(data, read_dpi)?,
        ImageType::Jpeg => jpeg::parse_jpeg(data)?,
        ImageType::Gif => gif::parse_gif(data)?,
    };
    Ok(info.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_type_from_extension() {
        assert_eq!(ImageType::from_path("a/b/logo.PNG").unwrap(), ImageType::Png);
        assert_eq!(ImageType::from_path("photo.jpeg").unwrap(), ImageType::Jpeg);
        assert!(matches!(
            ImageType::from_path("x.bmp"),
            Err(PdfError::UnsupportedImageType(_))
        ));
        assert!(ImageType::from_path("noext").is_err());
    }

    #[test]
    fn extent_uses_dpi() {
        let info = ImageInfo {
            width: 144.0,
            height: 72.0,
            dpi: 144.0,
            ..ImageInfo::default()
        };
        assert_eq!(info.extent(1.0), (72.0, 36.0));
    }
}
