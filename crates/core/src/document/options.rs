//! Document construction options.
//!
//! [`DocumentOptions`] is the plain configuration struct; [`DocumentBuilder`]
//! is a fluent wrapper that produces a ready [`Document`].
//!
//! # Example
//! ```ignore
//! use vellum_core::document::{DocumentBuilder, PageSize, Unit};
//!
//! let mut doc = DocumentBuilder::new()
//!     .unit(Unit::Point)
//!     .size(PageSize::Letter)
//!     .compression(false)
//!     .build();
//! doc.add_page();
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use time::OffsetDateTime;

use super::Document;
use crate::error::{PdfError, Result};
use crate::font::FontLoader;
use crate::utils::Size;

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "p" | "portrait" => Ok(Orientation::Portrait),
            "l" | "landscape" => Ok(Orientation::Landscape),
            other => Err(PdfError::InvalidArgument(format!(
                "incorrect orientation: {other}"
            ))),
        }
    }
}

/// User unit of measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unit {
    Point,
    #[default]
    Millimeter,
    Centimeter,
    Inch,
}

impl Unit {
    /// Number of points in one unit.
    pub fn scale_factor(self) -> f64 {
        match self {
            Unit::Point => 1.0,
            Unit::Millimeter => 72.0 / 25.4,
            Unit::Centimeter => 72.0 / 2.54,
            Unit::Inch => 72.0,
        }
    }
}

impl FromStr for Unit {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pt" | "point" => Ok(Unit::Point),
            "" | "mm" => Ok(Unit::Millimeter),
            "cm" => Ok(Unit::Centimeter),
            "in" | "inch" => Ok(Unit::Inch),
            other => Err(PdfError::InvalidArgument(format!("incorrect unit: {other}"))),
        }
    }
}

/// Page format. Named formats are given in points, portrait; a custom size
/// is in user units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PageSize {
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
    Letter,
    Legal,
    Tabloid,
    Custom(Size),
}

impl PageSize {
    /// Portrait dimensions in points, `None` for a custom size.
    pub fn points(self) -> Option<Size> {
        let (wd, ht) = match self {
            PageSize::A1 => (1683.78, 2383.94),
            PageSize::A2 => (1190.55, 1683.78),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (420.94, 595.28),
            PageSize::A6 => (297.64, 420.94),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom(_) => return None,
        };
        Some(Size::new(wd, ht))
    }

    /// Dimensions in user units for scale factor `k`.
    pub fn to_user(self, k: f64) -> Size {
        match self {
            PageSize::Custom(size) => size,
            named => named
                .points()
                .map(|s| Size::new(s.wd / k, s.ht / k))
                .unwrap_or_default(),
        }
    }
}

impl FromStr for PageSize {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "a1" => Ok(PageSize::A1),
            "a2" => Ok(PageSize::A2),
            "a3" => Ok(PageSize::A3),
            "" | "a4" => Ok(PageSize::A4),
            "a5" => Ok(PageSize::A5),
            "a6" => Ok(PageSize::A6),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            "tabloid" => Ok(PageSize::Tabloid),
            other => Err(PdfError::InvalidArgument(format!("unknown page size {other}"))),
        }
    }
}

/// Initial magnification in the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ZoomMode {
    FullPage,
    FullWidth,
    Real,
    #[default]
    Default,
    /// Zoom factor in percent.
    Percent(f64),
}

/// Initial page arrangement in the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutMode {
    Single,
    Continuous,
    TwoColumnLeft,
    TwoColumnRight,
    TwoPageLeft,
    TwoPageRight,
    #[default]
    Default,
}

/// PDF header version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfVersion(pub u8, pub u8);

impl PdfVersion {
    pub const V1_3: PdfVersion = PdfVersion(1, 3);
    pub const V1_4: PdfVersion = PdfVersion(1, 4);
    pub const V1_5: PdfVersion = PdfVersion(1, 5);
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Options for creating a [`Document`].
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub orientation: Orientation,
    pub unit: Unit,
    pub size: PageSize,
    /// Directory holding `.json` font definitions and `.z` font programs.
    pub font_dir: PathBuf,
    /// Deflate page content and other streams.
    pub compression: bool,
    /// Producer entry of the document information dictionary.
    pub producer: String,
    /// Fixed creation date; the close time when `None`.
    pub creation_date: Option<OffsetDateTime>,
    /// Fixed modification date; the creation date when `None`.
    pub mod_date: Option<OffsetDateTime>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            unit: Unit::Millimeter,
            size: PageSize::A4,
            font_dir: PathBuf::from("."),
            compression: true,
            producer: concat!("vellum ", env!("CARGO_PKG_VERSION")).to_string(),
            creation_date: None,
            mod_date: None,
        }
    }
}

/// A builder for configuring a document.
///
/// Wraps [`DocumentOptions`] and an optional custom [`FontLoader`].
#[derive(Clone, Default)]
pub struct DocumentBuilder {
    options: DocumentOptions,
    font_loader: Option<Arc<dyn FontLoader>>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.options.unit = unit;
        self
    }

    pub fn size(mut self, size: PageSize) -> Self {
        self.options.size = size;
        self
    }

    pub fn font_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.options.font_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Read font files through `loader` instead of the font directory.
    pub fn font_loader(mut self, loader: Arc<dyn FontLoader>) -> Self {
        self.font_loader = Some(loader);
        self
    }

    pub fn compression(mut self, compress: bool) -> Self {
        self.options.compression = compress;
        self
    }

    pub fn producer(mut self, producer: &str) -> Self {
        self.options.producer = producer.to_string();
        self
    }

    /// Fix the creation date, for reproducible output.
    pub fn creation_date(mut self, date: OffsetDateTime) -> Self {
        self.options.creation_date = Some(date);
        self
    }

    pub fn mod_date(mut self, date: OffsetDateTime) -> Self {
        self.options.mod_date = Some(date);
        self
    }

    /// Returns the options this builder would create a document with.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn build(self) -> Document {
        let mut doc = Document::with_options(self.options);
        if let Some(loader) = self.font_loader {
            doc.set_font_loader(loader);
        }
        doc
    }
}
