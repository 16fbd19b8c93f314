//! vellum - An incremental PDF document generator.
//!
//! Pages are built by issuing drawing and text calls on a [`Document`];
//! the file is assembled when the document is closed.

pub mod chart;
pub mod codec;
pub mod document;
pub mod error;
pub mod font;
pub mod image;
pub mod layout;
pub mod svg;
pub mod utils;

pub use codec::arcfour;
pub use codec::flate;

pub use chart::Grid;
pub use document::{
    BlendMode, Cmyk, Document, DocumentBuilder, DocumentOptions, Layer, LayoutMode, NextPosition,
    Orientation, PageBoxKind, PageHook, PageSize, PdfVersion, Permissions, Protection, SpotColor,
    Template, Unit, ZoomMode,
};
pub use font::{FontLoader, FontType};
pub use image::{ImageInfo, ImageOptions, ImageType};
pub use svg::{SvgBasic, SvgSegment};
pub use utils::{Point, Size};

pub use error::{PdfError, Result};
