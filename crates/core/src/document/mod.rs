//! The PDF document generator.
//!
//! A [`Document`] accumulates pages of content-stream operators and the
//! resources they use, then serializes everything in one pass when it is
//! closed. Its methods are grouped by concern:
//! - `page` - pages, margins, cursor, header / footer hooks
//! - `draw` - colors, lines, shapes, transparency
//! - `text` - cells, flowing text, line splitting
//! - `fonts` - font selection and embedding
//! - `images` - image registration and placement
//! - `spotcolor`, `layer`, `template` - named colors, optional content, forms
//! - `security` - the RC4 standard security handler
//! - `writer`, `output` - object buffering and the final file layout
//!
//! Errors latch: the first failure is stored, every later mutating call
//! returns immediately, and the output call reports the stored error.

mod draw;
mod fonts;
mod images;
mod layer;
pub mod options;
mod output;
mod page;
pub mod security;
mod spotcolor;
pub mod template;
mod text;
mod writer;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use time::OffsetDateTime;
use tracing::warn;

use crate::error::PdfError;
use crate::font::encoding::encode_cp1252;
use crate::font::{DirFontLoader, FontCatalog, FontLoader, LoadedFont};
use crate::image::ImageInfo;
use crate::utils::{Size, utf8_to_utf16};

pub use draw::BlendMode;
pub use layer::Layer;
pub use options::{
    DocumentBuilder, DocumentOptions, LayoutMode, Orientation, PageSize, PdfVersion, Unit,
    ZoomMode,
};
pub use page::{PageBoxKind, PageHook};
pub use security::{Permissions, Protection};
pub use spotcolor::{Cmyk, SpotColor};
pub use template::Template;
pub use text::NextPosition;

/// Lifecycle of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocState {
    /// No page added yet.
    Initial,
    /// Between pages, and while the file is being assembled.
    PageClosed,
    /// Content is being written to the current page.
    PageOpen,
    /// The file is complete.
    Closed,
}

/// A color as last set, together with the operator that selects it.
#[derive(Debug, Clone, Default, PartialEq)]
struct Color {
    rgb: (u8, u8, u8),
    /// Name of the spot color, when one is selected.
    spot: Option<String>,
    op: String,
}

impl Color {
    fn rgb(r: u8, g: u8, b: u8, gray_op: &str, rgb_op: &str) -> Self {
        let (fr, fg, fb) = (f64::from(r) / 255.0, f64::from(g) / 255.0, f64::from(b) / 255.0);
        let op = if r == g && r == b {
            format!("{fr:.3} {gray_op}")
        } else {
            format!("{fr:.3} {fg:.3} {fb:.3} {rgb_op}")
        };
        Self {
            rgb: (r, g, b),
            spot: None,
            op,
        }
    }
}

/// An `/ExtGState` entry: alpha values and blend mode.
#[derive(Debug, Clone)]
struct BlendState {
    fill_alpha: String,
    stroke_alpha: String,
    mode: BlendMode,
    object: usize,
}

/// An incrementally built PDF document.
pub struct Document {
    unit: Unit,
    /// Points per user unit.
    k: f64,
    def_orientation: Orientation,
    cur_orientation: Orientation,
    /// Default page size in user units, as given (portrait).
    def_page_size: Size,
    cur_page_size: Size,
    /// Current page width and height in user units.
    w: f64,
    h: f64,
    w_pt: f64,
    h_pt: f64,
    /// Sizes in points of pages that differ from the default.
    page_sizes: HashMap<usize, Size>,
    page_boxes: HashMap<usize, IndexMap<PageBoxKind, [f64; 4]>>,
    default_page_boxes: IndexMap<PageBoxKind, [f64; 4]>,
    page_rotations: HashMap<usize, i32>,
    default_rotation: i32,

    state: DocState,
    /// Page content; index 0 is unused so pages are numbered from 1.
    pages: Vec<Vec<u8>>,
    page: usize,
    buffer: Vec<u8>,
    n: usize,
    offsets: Vec<usize>,
    compress: bool,
    version: PdfVersion,

    l_margin: f64,
    t_margin: f64,
    r_margin: f64,
    b_margin: f64,
    c_margin: f64,
    x: f64,
    y: f64,
    lasth: f64,
    auto_page_break: bool,
    page_break_trigger: f64,
    in_header: bool,
    in_footer: bool,
    header_fn: Option<PageHook>,
    footer_fn: Option<PageHook>,
    header_home_mode: bool,
    alias_nb: Option<String>,

    line_width: f64,
    cap_style: u8,
    join_style: u8,
    draw_color: Color,
    fill_color: Color,
    text_color: Color,
    color_flag: bool,
    /// Word spacing in user units.
    ws: f64,
    blend_list: Vec<BlendState>,
    blend_map: HashMap<String, usize>,

    font_dir: PathBuf,
    font_loader: Arc<dyn FontLoader>,
    fonts: FontCatalog,
    font_family: String,
    font_style: String,
    underline: bool,
    strikeout: bool,
    current_font: Option<LoadedFont>,
    font_size_pt: f64,
    font_size: f64,

    images: IndexMap<String, Arc<ImageInfo>>,
    spot_colors: IndexMap<String, SpotColor>,
    layers: Vec<Layer>,
    current_layer: Option<usize>,
    open_layer_pane: bool,
    templates: IndexMap<String, Template>,

    font_objects: HashMap<String, usize>,
    font_file_objects: HashMap<String, usize>,
    image_objects: IndexMap<String, usize>,
    template_objects: HashMap<String, usize>,

    title: Vec<u8>,
    subject: Vec<u8>,
    author: Vec<u8>,
    keywords: Vec<u8>,
    creator: Vec<u8>,
    producer: String,
    creation_date: Option<OffsetDateTime>,
    mod_date: Option<OffsetDateTime>,
    zoom_mode: ZoomMode,
    layout_mode: LayoutMode,

    protection: Option<Protection>,
    err: Option<PdfError>,
}

impl Document {
    /// Create a document with the given default orientation, unit, page size
    /// and font directory.
    pub fn new(
        orientation: Orientation,
        unit: Unit,
        size: PageSize,
        font_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_options(DocumentOptions {
            orientation,
            unit,
            size,
            font_dir: font_dir.into(),
            ..DocumentOptions::default()
        })
    }

    pub fn with_options(opts: DocumentOptions) -> Self {
        let k = opts.unit.scale_factor();
        let def_page_size = opts.size.to_user(k);
        let (w, h) = match opts.orientation {
            Orientation::Portrait => (def_page_size.wd, def_page_size.ht),
            Orientation::Landscape => (def_page_size.ht, def_page_size.wd),
        };
        // one centimeter
        let margin = 28.35 / k;
        let b_margin = 2.0 * margin;
        let font_dir = opts.font_dir;
        Self {
            unit: opts.unit,
            k,
            def_orientation: opts.orientation,
            cur_orientation: opts.orientation,
            def_page_size,
            cur_page_size: def_page_size,
            w,
            h,
            w_pt: w * k,
            h_pt: h * k,
            page_sizes: HashMap::new(),
            page_boxes: HashMap::new(),
            default_page_boxes: IndexMap::new(),
            page_rotations: HashMap::new(),
            default_rotation: 0,

            state: DocState::Initial,
            pages: vec![Vec::new()],
            page: 0,
            buffer: Vec::new(),
            n: 2,
            offsets: vec![0; 3],
            compress: opts.compression,
            version: PdfVersion::V1_3,

            l_margin: margin,
            t_margin: margin,
            r_margin: margin,
            b_margin,
            c_margin: margin / 10.0,
            x: 0.0,
            y: 0.0,
            lasth: 0.0,
            auto_page_break: true,
            page_break_trigger: h - b_margin,
            in_header: false,
            in_footer: false,
            header_fn: None,
            footer_fn: None,
            header_home_mode: false,
            alias_nb: None,

            // 0.2 mm
            line_width: 0.567 / k,
            cap_style: 0,
            join_style: 0,
            draw_color: Color::rgb(0, 0, 0, "G", "RG"),
            fill_color: Color::rgb(0, 0, 0, "g", "rg"),
            text_color: Color::rgb(0, 0, 0, "g", "rg"),
            color_flag: false,
            ws: 0.0,
            blend_list: Vec::new(),
            blend_map: HashMap::new(),

            font_loader: Arc::new(DirFontLoader::new(&font_dir)),
            font_dir,
            fonts: FontCatalog::default(),
            font_family: String::new(),
            font_style: String::new(),
            underline: false,
            strikeout: false,
            current_font: None,
            font_size_pt: 12.0,
            font_size: 12.0 / k,

            images: IndexMap::new(),
            spot_colors: IndexMap::new(),
            layers: Vec::new(),
            current_layer: None,
            open_layer_pane: false,
            templates: IndexMap::new(),

            font_objects: HashMap::new(),
            font_file_objects: HashMap::new(),
            image_objects: IndexMap::new(),
            template_objects: HashMap::new(),

            title: Vec::new(),
            subject: Vec::new(),
            author: Vec::new(),
            keywords: Vec::new(),
            creator: Vec::new(),
            producer: opts.producer,
            creation_date: opts.creation_date,
            mod_date: opts.mod_date,
            zoom_mode: ZoomMode::Default,
            layout_mode: LayoutMode::Default,

            protection: None,
            err: None,
        }
    }

    /// Start a [`DocumentBuilder`].
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Read font definitions and programs through `loader`.
    pub fn set_font_loader(&mut self, loader: Arc<dyn FontLoader>) {
        self.font_loader = loader;
    }

    /// Latch `err` unless an error is already pending.
    pub fn set_error(&mut self, err: PdfError) {
        if self.err.is_none() {
            warn!(error = %err, "document error latched");
            self.err = Some(err);
        }
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<&PdfError> {
        self.err.as_ref()
    }

    /// Whether no error has been latched.
    pub fn ok(&self) -> bool {
        self.err.is_none()
    }

    /// Forget a latched error so that generation can continue.
    pub fn clear_error(&mut self) {
        self.err = None;
    }

    /// Scale factor: number of points per user unit.
    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Convert a length in points to user units.
    pub fn point_to_unit(&self, pt: f64) -> f64 {
        pt / self.k
    }

    /// Convert a length in user units to points.
    pub fn unit_to_point(&self, u: f64) -> f64 {
        u * self.k
    }

    pub fn version(&self) -> PdfVersion {
        self.version
    }

    pub(crate) fn require_version(&mut self, version: PdfVersion) {
        if self.version < version {
            self.version = version;
        }
    }

    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    pub fn compression(&self) -> bool {
        self.compress
    }

    pub fn set_title(&mut self, title: &str, is_utf8: bool) {
        self.title = info_string(title, is_utf8);
    }

    pub fn set_subject(&mut self, subject: &str, is_utf8: bool) {
        self.subject = info_string(subject, is_utf8);
    }

    pub fn set_author(&mut self, author: &str, is_utf8: bool) {
        self.author = info_string(author, is_utf8);
    }

    pub fn set_keywords(&mut self, keywords: &str, is_utf8: bool) {
        self.keywords = info_string(keywords, is_utf8);
    }

    pub fn set_creator(&mut self, creator: &str, is_utf8: bool) {
        self.creator = info_string(creator, is_utf8);
    }

    pub fn set_producer(&mut self, producer: &str) {
        self.producer = producer.to_string();
    }

    pub fn set_creation_date(&mut self, date: OffsetDateTime) {
        self.creation_date = Some(date);
    }

    pub fn set_modification_date(&mut self, date: OffsetDateTime) {
        self.mod_date = Some(date);
    }

    /// Protect the document with the standard security handler. An empty
    /// owner password is replaced by a random one.
    pub fn set_protection(
        &mut self,
        permissions: Permissions,
        user_password: &str,
        owner_password: &str,
    ) {
        if self.err.is_some() {
            return;
        }
        self.protection = Some(Protection::new(permissions, user_password, owner_password));
    }

    /// The security state once [`Document::set_protection`] has been called.
    pub fn protection(&self) -> Option<&Protection> {
        self.protection.as_ref()
    }

    /// Viewer magnification and page arrangement on open. The two-page
    /// layouts require PDF 1.5.
    pub fn set_display_mode(&mut self, zoom: ZoomMode, layout: LayoutMode) {
        if self.err.is_some() {
            return;
        }
        if matches!(layout, LayoutMode::TwoPageLeft | LayoutMode::TwoPageRight) {
            self.require_version(PdfVersion::V1_5);
        }
        self.zoom_mode = zoom;
        self.layout_mode = layout;
    }
}

fn info_string(s: &str, is_utf8: bool) -> Vec<u8> {
    if is_utf8 {
        utf8_to_utf16(s, true)
    } else {
        encode_cp1252(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_unit() {
        let doc = Document::new(Orientation::Portrait, Unit::Point, PageSize::A4, ".");
        assert_eq!(doc.k(), 1.0);
        assert_eq!(doc.l_margin, 28.35);
        assert!((doc.c_margin - 2.835).abs() < 1e-12);
        assert_eq!(doc.line_width, 0.567);
        assert_eq!(doc.page_break_trigger, 841.89 - 56.7);
        assert_eq!(doc.version(), PdfVersion::V1_3);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let doc = Document::new(Orientation::Landscape, Unit::Point, PageSize::Letter, ".");
        assert_eq!((doc.w, doc.h), (792.0, 612.0));
    }

    #[test]
    fn first_error_wins() {
        let mut doc = Document::with_options(DocumentOptions::default());
        doc.set_error(PdfError::Custom("first".into()));
        doc.set_error(PdfError::Custom("second".into()));
        assert_eq!(doc.error().unwrap().to_string(), "first");
        doc.clear_error();
        assert!(doc.ok());
    }

    #[test]
    fn initial_gray_operators() {
        let doc = Document::with_options(DocumentOptions::default());
        assert_eq!(doc.draw_color.op, "0.000 G");
        assert_eq!(Color::rgb(255, 0, 0, "g", "rg").op, "1.000 0.000 0.000 rg");
    }
}
