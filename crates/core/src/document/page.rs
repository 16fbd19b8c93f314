//! Pages, margins, the cursor and header / footer hooks.

use std::str::FromStr;

use super::{DocState, Document, Orientation};
use crate::error::{PdfError, Result};
use crate::utils::Size;

/// Callback run when a page begins (header) or ends (footer).
pub type PageHook = Box<dyn FnMut(&mut Document) + Send>;

/// Page boundary boxes besides the media box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageBoxKind {
    CropBox,
    BleedBox,
    TrimBox,
    ArtBox,
}

impl PageBoxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PageBoxKind::CropBox => "CropBox",
            PageBoxKind::BleedBox => "BleedBox",
            PageBoxKind::TrimBox => "TrimBox",
            PageBoxKind::ArtBox => "ArtBox",
        }
    }
}

impl FromStr for PageBoxKind {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "crop" | "cropbox" => Ok(PageBoxKind::CropBox),
            "bleed" | "bleedbox" => Ok(PageBoxKind::BleedBox),
            "trim" | "trimbox" => Ok(PageBoxKind::TrimBox),
            "art" | "artbox" => Ok(PageBoxKind::ArtBox),
            other => Err(PdfError::InvalidArgument(format!("unknown page box {other}"))),
        }
    }
}

impl Document {
    /// Add a page with the default orientation and size.
    pub fn add_page(&mut self) {
        if self.err.is_some() {
            return;
        }
        self.add_page_format(self.def_orientation, self.def_page_size);
    }

    /// Add a page of the given orientation and size (user units, portrait).
    ///
    /// The footer hook runs for the page being closed, then the new page
    /// restores line width, font and colors and runs the header hook.
    pub fn add_page_format(&mut self, orientation: Orientation, size: Size) {
        if self.err.is_some() {
            return;
        }
        if self.state == DocState::Closed {
            self.set_error(PdfError::Closed);
            return;
        }
        self.page = self.pages.len() - 1;
        let family = self.font_family.clone();
        let mut style = self.font_style.clone();
        if self.underline {
            style.push('U');
        }
        if self.strikeout {
            style.push('S');
        }
        let font_size = self.font_size_pt;
        let lw = self.line_width;
        let dc = self.draw_color.clone();
        let fc = self.fill_color.clone();
        let tc = self.text_color.clone();
        let cf = self.color_flag;

        if self.page > 0 {
            self.run_footer();
            self.end_page();
        }
        self.begin_page(orientation, size);
        self.out(&format!("{} J", self.cap_style));
        self.out(&format!("{} j", self.join_style));
        self.line_width = lw;
        self.out(&format!("{:.2} w", lw * self.k));
        if !family.is_empty() {
            self.set_font(&family, &style, font_size);
            if self.err.is_some() {
                return;
            }
        }
        if dc.op != "0.000 G" {
            self.out(&dc.op);
        }
        self.draw_color = dc.clone();
        if fc.op != "0.000 g" {
            self.out(&fc.op);
        }
        self.fill_color = fc.clone();
        self.text_color = tc.clone();
        self.color_flag = cf;

        if let Some(mut header) = self.header_fn.take() {
            self.in_header = true;
            header(self);
            self.in_header = false;
            if self.header_fn.is_none() {
                self.header_fn = Some(header);
            }
            if self.header_home_mode {
                self.set_home_xy();
            }
        }

        if self.line_width != lw {
            self.line_width = lw;
            self.out(&format!("{:.2} w", lw * self.k));
        }
        if !family.is_empty() {
            self.set_font(&family, &style, font_size);
            if self.err.is_some() {
                return;
            }
        }
        if self.draw_color.op != dc.op {
            self.out(&dc.op);
            self.draw_color = dc;
        }
        if self.fill_color.op != fc.op {
            self.out(&fc.op);
            self.fill_color = fc;
        }
        self.text_color = tc;
        self.color_flag = cf;
    }

    pub(crate) fn run_footer(&mut self) {
        if let Some(mut footer) = self.footer_fn.take() {
            self.in_footer = true;
            footer(self);
            self.in_footer = false;
            if self.footer_fn.is_none() {
                self.footer_fn = Some(footer);
            }
        }
    }

    fn begin_page(&mut self, orientation: Orientation, size: Size) {
        self.page += 1;
        self.pages.push(Vec::new());
        self.page_boxes
            .insert(self.page, self.default_page_boxes.clone());
        if self.default_rotation != 0 {
            self.page_rotations.insert(self.page, self.default_rotation);
        }
        self.state = DocState::PageOpen;
        self.x = self.l_margin;
        self.y = self.t_margin;
        self.font_family.clear();

        if orientation != self.cur_orientation || size != self.cur_page_size {
            (self.w, self.h) = match orientation {
                Orientation::Portrait => (size.wd, size.ht),
                Orientation::Landscape => (size.ht, size.wd),
            };
            self.w_pt = self.w * self.k;
            self.h_pt = self.h * self.k;
            self.page_break_trigger = self.h - self.b_margin;
            self.cur_orientation = orientation;
            self.cur_page_size = size;
        }
        if orientation != self.def_orientation || size != self.def_page_size {
            self.page_sizes
                .insert(self.page, Size::new(self.w_pt, self.h_pt));
        }
    }

    pub(crate) fn end_page(&mut self) {
        self.end_layer();
        self.state = DocState::PageClosed;
    }

    /// Run `f` at the start of every page. The cursor is moved to the top
    /// left margin afterwards when `home_mode` is set.
    pub fn set_header_fn(&mut self, f: PageHook, home_mode: bool) {
        self.header_fn = Some(f);
        self.header_home_mode = home_mode;
    }

    /// Run `f` at the end of every page, including the last one at close.
    pub fn set_footer_fn(&mut self, f: PageHook) {
        self.footer_fn = Some(f);
    }

    /// Replace `alias` (`{nb}` when empty) with the page count at output.
    pub fn alias_nb_pages(&mut self, alias: &str) {
        let alias = if alias.is_empty() { "{nb}" } else { alias };
        self.alias_nb = Some(alias.to_string());
    }

    /// Current page number.
    pub fn page_no(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.pages.len() - 1
    }

    /// Make page `n` current so that further content is appended to it.
    /// Out-of-range values are ignored.
    pub fn set_page(&mut self, n: usize) {
        if n > 0 && n < self.pages.len() {
            self.page = n;
        }
    }

    /// Size of page `n` in user units.
    pub fn page_size(&self, n: usize) -> Size {
        if let Some(size) = self.page_sizes.get(&n) {
            return Size::new(size.wd / self.k, size.ht / self.k);
        }
        match self.def_orientation {
            Orientation::Portrait => self.def_page_size,
            Orientation::Landscape => self.def_page_size.swapped(),
        }
    }

    /// Width and height of the current page in user units.
    pub fn get_page_size(&self) -> (f64, f64) {
        (self.w, self.h)
    }

    /// Rotate the current page (or, before the first page, every page) for
    /// display. `degrees` must be a multiple of 90 and becomes the default
    /// for pages added later.
    pub fn set_page_rotation(&mut self, degrees: i32) {
        if self.err.is_some() {
            return;
        }
        if degrees % 90 != 0 {
            self.set_error(PdfError::InvalidArgument(format!(
                "page rotation must be a multiple of 90, got {degrees}"
            )));
            return;
        }
        let degrees = degrees.rem_euclid(360);
        self.default_rotation = degrees;
        if self.page > 0 {
            self.page_rotations.insert(self.page, degrees);
        }
    }

    /// Set a boundary box of the current page, or of every later page when
    /// no page exists yet. Coordinates are in user units from the bottom
    /// left corner.
    pub fn set_page_box(&mut self, kind: PageBoxKind, x: f64, y: f64, wd: f64, ht: f64) {
        if self.err.is_some() {
            return;
        }
        let k = self.k;
        let rect = [x * k, y * k, wd * k + x * k, ht * k + y * k];
        if self.page > 0 {
            self.page_boxes
                .entry(self.page)
                .or_default()
                .insert(kind, rect);
        } else {
            self.default_page_boxes.insert(kind, rect);
        }
    }

    /// Left, top and right margins. A negative right margin copies the left.
    pub fn set_margins(&mut self, left: f64, top: f64, right: f64) {
        self.l_margin = left;
        self.t_margin = top;
        self.r_margin = if right < 0.0 { left } else { right };
    }

    pub fn set_left_margin(&mut self, margin: f64) {
        self.l_margin = margin;
        if self.page > 0 && self.x < margin {
            self.x = margin;
        }
    }

    pub fn set_top_margin(&mut self, margin: f64) {
        self.t_margin = margin;
    }

    pub fn set_right_margin(&mut self, margin: f64) {
        self.r_margin = margin;
    }

    /// Left, top, right and bottom margins.
    pub fn get_margins(&self) -> (f64, f64, f64, f64) {
        (self.l_margin, self.t_margin, self.r_margin, self.b_margin)
    }

    /// Horizontal padding inside cells.
    pub fn set_cell_margin(&mut self, margin: f64) {
        self.c_margin = margin;
    }

    pub fn get_cell_margin(&self) -> f64 {
        self.c_margin
    }

    /// Enable automatic page breaks `margin` above the bottom edge.
    pub fn set_auto_page_break(&mut self, auto: bool, margin: f64) {
        self.auto_page_break = auto;
        self.b_margin = margin;
        self.page_break_trigger = self.h - margin;
    }

    pub fn get_auto_page_break(&self) -> (bool, f64) {
        (self.auto_page_break, self.b_margin)
    }

    /// Whether content of height `h` at the cursor triggers a page break.
    pub(crate) fn needs_page_break(&self, h: f64) -> bool {
        self.y + h > self.page_break_trigger
            && !self.in_header
            && !self.in_footer
            && self.auto_page_break
    }

    pub fn get_x(&self) -> f64 {
        self.x
    }

    pub fn get_y(&self) -> f64 {
        self.y
    }

    pub fn get_xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Set the abscissa; a negative value counts from the right edge.
    pub fn set_x(&mut self, x: f64) {
        self.x = if x >= 0.0 { x } else { self.w + x };
    }

    /// Set the ordinate and move the abscissa to the left margin; a negative
    /// value counts from the bottom edge.
    pub fn set_y(&mut self, y: f64) {
        self.x = self.l_margin;
        self.y = if y >= 0.0 { y } else { self.h + y };
    }

    pub fn set_xy(&mut self, x: f64, y: f64) {
        self.set_y(y);
        self.set_x(x);
    }

    /// Move the cursor to the top left margin.
    pub fn set_home_xy(&mut self) {
        self.set_y(self.t_margin);
        self.set_x(self.l_margin);
    }

    /// Line break: return to the left margin and move down by `h`, or by
    /// the height of the last cell when `h` is negative.
    pub fn ln(&mut self, h: f64) {
        self.x = self.l_margin;
        self.y += if h < 0.0 { self.lasth } else { h };
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DocumentOptions, PageSize, Unit};
    use super::*;

    fn doc() -> Document {
        Document::with_options(DocumentOptions {
            unit: Unit::Point,
            size: PageSize::Letter,
            compression: false,
            ..DocumentOptions::default()
        })
    }

    #[test]
    fn new_page_writes_graphics_state() {
        let mut doc = doc();
        doc.add_page();
        let content = String::from_utf8(doc.pages[1].clone()).unwrap();
        assert_eq!(content, "0 J\n0 j\n0.57 w\n0.000 G\n0.000 g\n");
        assert_eq!(doc.get_xy(), (28.35, 28.35));
    }

    #[test]
    fn custom_page_size_is_recorded() {
        let mut doc = doc();
        doc.add_page();
        doc.add_page_format(Orientation::Landscape, Size::new(100.0, 200.0));
        assert_eq!(doc.page_count(), 2);
        assert!(!doc.page_sizes.contains_key(&1));
        assert_eq!(doc.page_sizes[&2], Size::new(200.0, 100.0));
        assert_eq!(doc.page_size(2), Size::new(200.0, 100.0));
        assert_eq!(doc.page_size(1), Size::new(612.0, 792.0));
    }

    #[test]
    fn footer_and_header_hooks_run_per_page() {
        let mut doc = doc();
        doc.set_header_fn(Box::new(|d: &mut Document| d.out("% header")), false);
        doc.set_footer_fn(Box::new(|d: &mut Document| d.out("% footer")));
        doc.add_page();
        doc.add_page();
        let first = String::from_utf8(doc.pages[1].clone()).unwrap();
        assert!(first.contains("% header"));
        assert!(first.ends_with("% footer\n"));
        let second = String::from_utf8(doc.pages[2].clone()).unwrap();
        assert!(second.contains("% header"));
        assert!(!second.contains("% footer"));
    }

    #[test]
    fn set_page_rejects_out_of_range() {
        let mut doc = doc();
        doc.add_page();
        doc.add_page();
        doc.set_page(1);
        assert_eq!(doc.page_no(), 1);
        doc.set_page(5);
        assert_eq!(doc.page_no(), 1);
    }

    #[test]
    fn negative_coordinates_count_from_edges() {
        let mut doc = doc();
        doc.add_page();
        doc.set_xy(-100.0, -50.0);
        assert_eq!(doc.get_xy(), (512.0, 742.0));
    }

    #[test]
    fn rotation_must_be_right_angle() {
        let mut doc = doc();
        doc.add_page();
        doc.set_page_rotation(-90);
        assert_eq!(doc.page_rotations[&1], 270);
        doc.set_page_rotation(45);
        assert!(doc.error().is_some());
    }
}
