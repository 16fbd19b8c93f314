//! Error types for the vellum PDF generator.

use std::sync::Arc;
use thiserror::Error;

/// Primary error type for document generation.
///
/// The type is `Clone` because a document latches its first error and hands
/// it back both from [`crate::Document::error`] and from the output call.
#[derive(Error, Debug, Clone)]
pub enum PdfError {
    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("font has not been set; unable to render text")]
    FontNotSet,

    #[error("undefined font: {family} {style}")]
    UndefinedFont { family: String, style: String },

    #[error("could not locate \"{0}\" among embedded core font definition files")]
    CoreFontNotFound(String),

    #[error("font definition error: {0}")]
    FontDefinition(String),

    #[error("name \"{0}\" is already associated with a spot color")]
    DuplicateSpotColor(String),

    #[error("spot color name \"{0}\" is not registered")]
    UnknownSpotColor(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("svg error: {0}")]
    Svg(String),

    #[error("unexpected path command '{0}'")]
    UnsupportedPathCommand(char),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("document is closed")]
    Closed,

    #[error("{0}")]
    Custom(String),
}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::Io(Arc::new(err))
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
