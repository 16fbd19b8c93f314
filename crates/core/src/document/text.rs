//! Text output: positioned strings, cells, wrapped and flowing text.

use std::sync::Arc;

use super::Document;
use crate::error::PdfError;
use crate::font::FontDef;
use crate::layout::{self, BreakKind};
use crate::utils::escape;

/// Where the cursor goes after a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NextPosition {
    /// To the right of the cell.
    #[default]
    Right,
    /// To the beginning of the next line.
    NextLine,
    /// Below the cell, at the same abscissa.
    Below,
}

impl Document {
    /// The current font, latching [`PdfError::FontNotSet`] when none is
    /// selected.
    fn require_font(&mut self) -> Option<Arc<FontDef>> {
        match &self.current_font {
            Some(font) => Some(font.def.clone()),
            None => {
                self.set_error(PdfError::FontNotSet);
                None
            }
        }
    }

    fn bytes_width(&self, s: &[u8]) -> f64 {
        match &self.current_font {
            Some(font) => font.def.bytes_width(s) as f64 * self.font_size / 1000.0,
            None => 0.0,
        }
    }

    /// Width of `s` in user units in the current font, or zero when no font
    /// is selected.
    pub fn get_string_width(&self, s: &str) -> f64 {
        match &self.current_font {
            Some(font) => self.bytes_width(&font.def.encode(s)),
            None => 0.0,
        }
    }

    fn decoration(&self, x: f64, y: f64, s: &[u8], strike: bool) -> String {
        let Some(font) = &self.current_font else {
            return String::new();
        };
        let up = f64::from(font.def.up);
        let ut = f64::from(font.def.ut);
        let spaces = s.iter().filter(|&&b| b == b' ').count() as f64;
        let w = self.bytes_width(s) + self.ws * spaces;
        let offset = if strike {
            y + 4.0 * up / 1000.0 * self.font_size
        } else {
            y - up / 1000.0 * self.font_size
        };
        format!(
            "{:.2} {:.2} {:.2} {:.2} re f",
            x * self.k,
            (self.h - offset) * self.k,
            w * self.k,
            -ut / 1000.0 * self.font_size_pt
        )
    }

    fn decorations(&self, x: f64, y: f64, s: &[u8]) -> String {
        let mut out = String::new();
        if self.underline {
            out.push(' ');
            out.push_str(&self.decoration(x, y, s, false));
        }
        if self.strikeout {
            out.push(' ');
            out.push_str(&self.decoration(x, y, s, true));
        }
        out
    }

    /// Print `s` with its baseline origin at `(x, y)`.
    pub fn text(&mut self, x: f64, y: f64, s: &str) {
        if self.err.is_some() {
            return;
        }
        let Some(def) = self.require_font() else {
            return;
        };
        let bytes = def.encode(s);
        let mut line =
            format!("BT {:.2} {:.2} Td (", x * self.k, (self.h - y) * self.k).into_bytes();
        line.extend_from_slice(&escape(&bytes));
        line.extend_from_slice(b") Tj ET");
        if !bytes.is_empty() {
            line.extend_from_slice(self.decorations(x, y, &bytes).as_bytes());
        }
        if self.color_flag {
            let mut wrapped = format!("q {} ", self.text_color.op).into_bytes();
            wrapped.extend_from_slice(&line);
            wrapped.extend_from_slice(b" Q");
            line = wrapped;
        }
        self.out_bytes(&line);
    }

    /// A borderless, left-aligned cell; the cursor moves to its right.
    pub fn cell(&mut self, w: f64, h: f64, s: &str) {
        self.cell_format(w, h, s, "", NextPosition::Right, "L", false);
    }

    /// Print a rectangular cell with optional border, background and text.
    ///
    /// `border` is `""`, `"1"` for a frame, or any of `L`, `T`, `R`, `B`.
    /// `align` combines a horizontal (`L`, `C`, `R`) and a vertical (`T`,
    /// `M`, `B`, `A` for baseline) alignment. A width of zero extends the
    /// cell to the right margin. The page breaks first when the cell would
    /// cross the bottom margin.
    #[allow(clippy::too_many_arguments)]
    pub fn cell_format(
        &mut self,
        w: f64,
        h: f64,
        s: &str,
        border: &str,
        next: NextPosition,
        align: &str,
        fill: bool,
    ) {
        if self.err.is_some() {
            return;
        }
        let Some(def) = self.require_font() else {
            return;
        };
        let bytes = def.encode(s);
        self.cell_bytes(w, h, &bytes, border, next, align, fill);
    }

    #[allow(clippy::too_many_arguments)]
    fn cell_bytes(
        &mut self,
        mut w: f64,
        h: f64,
        s: &[u8],
        border: &str,
        next: NextPosition,
        align: &str,
        fill: bool,
    ) {
        if self.err.is_some() {
            return;
        }
        let Some(def) = self.require_font() else {
            return;
        };
        let border = border.to_uppercase();
        let k = self.k;
        if self.needs_page_break(h) {
            let x = self.x;
            let ws = self.ws;
            if ws > 0.0 {
                self.ws = 0.0;
                self.out("0 Tw");
            }
            self.add_page_format(self.cur_orientation, self.cur_page_size);
            if self.err.is_some() {
                return;
            }
            self.x = x;
            if ws > 0.0 {
                self.ws = ws;
                self.out(&format!("{:.3} Tw", ws * k));
            }
        }
        if w == 0.0 {
            w = self.w - self.r_margin - self.x;
        }

        let mut out: Vec<u8> = Vec::new();
        if h > 0.0 && (fill || border == "1") {
            let op = match (fill, border == "1") {
                (true, true) => "B",
                (true, false) => "f",
                _ => "S",
            };
            out.extend_from_slice(
                format!(
                    "{:.2} {:.2} {:.2} {:.2} re {op} ",
                    self.x * k,
                    (self.h - self.y) * k,
                    w * k,
                    -h * k
                )
                .as_bytes(),
            );
        }
        if !border.is_empty() && border != "1" {
            let left = self.x * k;
            let top = (self.h - self.y) * k;
            let right = (self.x + w) * k;
            let bottom = (self.h - (self.y + h)) * k;
            let mut edge = |c: char, x1: f64, y1: f64, x2: f64, y2: f64| {
                if border.contains(c) {
                    out.extend_from_slice(
                        format!("{x1:.2} {y1:.2} m {x2:.2} {y2:.2} l S ").as_bytes(),
                    );
                }
            };
            edge('L', left, top, left, bottom);
            edge('T', left, top, right, top);
            edge('R', right, top, right, bottom);
            edge('B', left, bottom, right, bottom);
        }
        if !s.is_empty() {
            let sw = self.bytes_width(s);
            let dx = if align.contains('R') {
                w - self.c_margin - sw
            } else if align.contains('C') {
                (w - sw) / 2.0
            } else {
                self.c_margin
            };
            let dy = if align.contains('T') {
                (self.font_size - h) / 2.0
            } else if align.contains('B') {
                (h - self.font_size) / 2.0
            } else if align.contains('A') {
                let d = def.desc;
                let descent = if d.descent == 0 {
                    -0.19 * self.font_size
                } else {
                    f64::from(d.descent) * self.font_size / f64::from(d.ascent - d.descent)
                };
                (h - self.font_size) / 2.0 - descent
            } else {
                0.0
            };
            if self.color_flag {
                out.extend_from_slice(format!("q {} ", self.text_color.op).as_bytes());
            }
            let tx = self.x + dx;
            let ty = self.y + dy + 0.5 * h + 0.3 * self.font_size;
            out.extend_from_slice(
                format!("BT {:.2} {:.2} Td (", tx * k, (self.h - ty) * k).as_bytes(),
            );
            out.extend_from_slice(&escape(s));
            out.extend_from_slice(b")Tj ET");
            out.extend_from_slice(self.decorations(tx, ty, s).as_bytes());
            if self.color_flag {
                out.extend_from_slice(b" Q");
            }
        }
        if !out.is_empty() {
            self.out_bytes(&out);
        }
        self.lasth = h;
        match next {
            NextPosition::Right => self.x += w,
            NextPosition::NextLine => {
                self.y += h;
                self.x = self.l_margin;
            }
            NextPosition::Below => self.y += h,
        }
    }

    /// Print text wrapped to cells of width `w` and height `h` each, one
    /// below the other. `align` defaults to full justification (`J`).
    /// Borders other than `"1"` draw the side edges on every line, the top
    /// edge on the first and the bottom edge on the last.
    pub fn multi_cell(&mut self, w: f64, h: f64, s: &str, border: &str, align: &str, fill: bool) {
        if self.err.is_some() {
            return;
        }
        let Some(def) = self.require_font() else {
            return;
        };
        let align = if align.is_empty() { "J" } else { align };
        let w = if w == 0.0 {
            self.w - self.r_margin - self.x
        } else {
            w
        };
        let wmax = layout::max_width(w, self.c_margin, self.font_size);
        let mut text = def.encode(s);
        text.retain(|&b| b != b'\r');

        let mut border = border.to_uppercase();
        let (mut b, b2) = if border.is_empty() {
            (String::new(), String::new())
        } else if border == "1" {
            border = "LTRB".into();
            ("LRT".to_string(), "LR".to_string())
        } else {
            let mut b2 = String::new();
            if border.contains('L') {
                b2.push('L');
            }
            if border.contains('R') {
                b2.push('R');
            }
            let b = if border.contains('T') {
                format!("{b2}T")
            } else {
                b2.clone()
            };
            (b, b2)
        };

        let mut lines = layout::break_bytes(&text, wmax, &def.cw);
        let last = match lines.last() {
            Some(line) if line.kind == BreakKind::End => lines.pop().map(|l| l.range()),
            _ => None,
        }
        .unwrap_or(text.len()..text.len());

        for line in &lines {
            if line.kind == BreakKind::Word && align == "J" {
                let spaces = text[line.range()].iter().filter(|&&c| c == b' ').count();
                self.ws = if spaces > 0 {
                    (wmax - line.width) as f64 / 1000.0 * self.font_size / spaces as f64
                } else {
                    0.0
                };
                self.out(&format!("{:.3} Tw", self.ws * self.k));
            } else if self.ws > 0.0 {
                self.ws = 0.0;
                self.out("0 Tw");
            }
            self.cell_bytes(w, h, &text[line.range()], &b, NextPosition::Below, align, fill);
            if !border.is_empty() {
                b = b2.clone();
            }
        }
        if self.ws > 0.0 {
            self.ws = 0.0;
            self.out("0 Tw");
        }
        if border.contains('B') {
            b.push('B');
        }
        self.cell_bytes(w, h, &text[last], &b, NextPosition::Below, align, fill);
        self.x = self.l_margin;
    }

    /// Flowing text from the current position. Lines wrap at the right
    /// margin and continue at the left margin; the cursor ends after the
    /// last character.
    pub fn write(&mut self, h: f64, s: &str) {
        if self.err.is_some() {
            return;
        }
        let Some(def) = self.require_font() else {
            return;
        };
        let mut text = def.encode(s);
        text.retain(|&b| b != b'\r');
        let nb = text.len();

        let limit = |doc: &Document| {
            let w = doc.w - doc.r_margin - doc.x;
            (w, (w - 2.0 * doc.c_margin) * 1000.0 / doc.font_size)
        };
        let (mut w, mut wmax) = limit(self);
        let mut sep: Option<usize> = None;
        let (mut i, mut j, mut l, mut nl) = (0usize, 0usize, 0f64, 1);
        while i < nb {
            let c = text[i];
            if c == b'\n' {
                self.cell_bytes(w, h, &text[j..i], "", NextPosition::Below, "", false);
                i += 1;
                sep = None;
                j = i;
                l = 0.0;
                if nl == 1 {
                    self.x = self.l_margin;
                    (w, wmax) = limit(self);
                }
                nl += 1;
                continue;
            }
            if c == b' ' {
                sep = Some(i);
            }
            l += f64::from(def.width(c));
            if l > wmax {
                match sep {
                    None => {
                        if self.x > self.l_margin {
                            // Nothing fits after the current position: move to
                            // the next line and measure this chunk again.
                            self.x = self.l_margin;
                            self.y += h;
                            (w, wmax) = limit(self);
                            i = j;
                            l = 0.0;
                            nl += 1;
                            continue;
                        }
                        if i == j {
                            i += 1;
                        }
                        self.cell_bytes(w, h, &text[j..i], "", NextPosition::Below, "", false);
                    }
                    Some(at) => {
                        self.cell_bytes(w, h, &text[j..at], "", NextPosition::Below, "", false);
                        i = at + 1;
                    }
                }
                sep = None;
                j = i;
                l = 0.0;
                if nl == 1 {
                    self.x = self.l_margin;
                    (w, wmax) = limit(self);
                }
                nl += 1;
            } else {
                i += 1;
            }
            if self.err.is_some() {
                return;
            }
        }
        if i != j {
            let width = l / 1000.0 * self.font_size;
            self.cell_bytes(width, h, &text[j..], "", NextPosition::Right, "", false);
        }
    }

    /// Flowing text in another font size, raised by `offset` points (for
    /// superscripts; negative for subscripts). The baseline shift also
    /// accounts for the size difference.
    pub fn sub_write(&mut self, h: f64, s: &str, sub_font_size: f64, offset: f64) {
        if self.err.is_some() {
            return;
        }
        let old_size = self.font_size_pt;
        self.set_font_size(sub_font_size);
        let offset = ((sub_font_size - old_size) / self.k) * 0.3 + offset / self.k;
        let (x, y) = (self.x, self.y);
        self.set_xy(x, y - offset);
        self.write(h, s);
        let (x, y) = (self.x, self.y);
        self.set_xy(x, y + offset);
        self.set_font_size(old_size);
    }

    /// Split single-byte encoded text into the lines [`Document::multi_cell`]
    /// would print in a cell of width `w`.
    pub fn split_lines(&mut self, text: &[u8], w: f64) -> Vec<Vec<u8>> {
        let Some(def) = self.require_font() else {
            return Vec::new();
        };
        let text: Vec<u8> = text.iter().copied().filter(|&b| b != b'\r').collect();
        let wmax = layout::max_width(w, self.c_margin, self.font_size);
        layout::break_bytes(&text, wmax, &def.cw)
            .into_iter()
            .map(|line| text[line.range()].to_vec())
            .collect()
    }

    /// Split UTF-8 text into lines fitting a cell of width `w`. Whitespace
    /// and CJK ideographs are break opportunities.
    pub fn split_text(&mut self, text: &str, w: f64) -> Vec<String> {
        let Some(def) = self.require_font() else {
            return Vec::new();
        };
        let chars: Vec<char> = text.chars().collect();
        let wmax = layout::max_width(w, self.c_margin, self.font_size);
        layout::break_chars(&chars, wmax, |c| i64::from(def.char_width(c)))
            .into_iter()
            .map(|line| chars[line.range()].iter().collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DocumentOptions, Unit};
    use super::*;

    fn doc() -> Document {
        let mut doc = Document::with_options(DocumentOptions {
            unit: Unit::Point,
            ..DocumentOptions::default()
        });
        doc.add_page();
        doc.set_font("helvetica", "", 10.0);
        doc.pages[1].clear();
        doc
    }

    fn content(doc: &Document) -> String {
        String::from_utf8_lossy(&doc.pages[1]).into_owned()
    }

    #[test]
    fn text_without_font_latches() {
        let mut doc = Document::with_options(DocumentOptions::default());
        doc.add_page();
        doc.text(10.0, 10.0, "hello");
        assert!(matches!(doc.error(), Some(PdfError::FontNotSet)));
    }

    #[test]
    fn text_operator() {
        let mut doc = doc();
        doc.text(10.0, 41.89, "a(b)");
        assert_eq!(content(&doc), "BT 10.00 800.00 Td (a\\(b\\)) Tj ET\n");
    }

    #[test]
    fn cell_moves_cursor() {
        let mut doc = doc();
        let (x, y) = doc.get_xy();
        doc.cell(50.0, 20.0, "");
        assert_eq!(doc.get_xy(), (x + 50.0, y));
        assert!(content(&doc).is_empty());
        doc.cell_format(50.0, 20.0, "", "1", NextPosition::NextLine, "", false);
        assert_eq!(doc.get_xy(), (doc.l_margin, y + 20.0));
        assert!(content(&doc).ends_with("re S \n"));
    }

    #[test]
    fn cell_edges() {
        let mut doc = doc();
        doc.set_xy(100.0, 100.0);
        doc.cell_format(10.0, 10.0, "", "LB", NextPosition::Right, "", false);
        assert_eq!(
            content(&doc),
            "100.00 741.89 m 100.00 731.89 l S 100.00 731.89 m 110.00 731.89 l S \n"
        );
    }

    #[test]
    fn right_aligned_text_uses_string_width() {
        let mut doc = doc();
        doc.set_xy(0.0, 0.0);
        doc.cell_format(100.0, 10.0, "A", "", NextPosition::Right, "R", false);
        let dx = 100.0 - doc.get_cell_margin() - doc.get_string_width("A");
        assert!((doc.get_string_width("A") - 6.67).abs() < 1e-9);
        assert!(content(&doc).starts_with(&format!("BT {dx:.2} ")));
    }

    #[test]
    fn colored_text_is_wrapped() {
        let mut doc = doc();
        doc.set_text_color(255, 0, 0);
        doc.cell(20.0, 10.0, "x");
        let text = content(&doc);
        assert!(text.starts_with("q 1.000 0.000 0.000 rg BT"));
        assert!(text.ends_with(")Tj ET Q\n"));
    }

    #[test]
    fn underline_appends_rectangle() {
        let mut doc = doc();
        doc.set_font("helvetica", "U", 10.0);
        doc.pages[1].clear();
        doc.cell(20.0, 10.0, "x");
        assert!(content(&doc).trim_end().ends_with("re f"));
    }

    #[test]
    fn multi_cell_wraps_and_justifies() {
        let mut doc = doc();
        doc.set_xy(0.0, 0.0);
        doc.multi_cell(60.0, 12.0, "one two three four five", "", "", false);
        let text = content(&doc);
        assert!(text.contains(" Tw\n"));
        let expected = doc.split_lines(b"one two three four five", 60.0).len();
        assert_eq!(text.matches("Tj ET").count(), expected);
        assert_eq!(doc.get_x(), doc.l_margin);
        assert_eq!(doc.ws, 0.0);
    }

    #[test]
    fn multi_cell_empty_text_is_one_cell() {
        let mut doc = doc();
        let y = doc.get_y();
        doc.multi_cell(60.0, 12.0, "", "1", "L", false);
        assert_eq!(doc.get_y(), y + 12.0);
    }

    #[test]
    fn write_wraps_at_margin() {
        let mut doc = doc();
        let y = doc.get_y();
        let words = "lorem ipsum dolor sit amet ".repeat(20);
        doc.write(12.0, &words);
        assert!(doc.get_y() > y);
        assert!(doc.ok());
    }

    #[test]
    fn write_long_word_after_text_moves_down() {
        let mut doc = doc();
        doc.set_x(500.0);
        let y = doc.get_y();
        doc.write(12.0, "abcdefghijklmnop");
        assert_eq!(doc.get_y(), y + 12.0);
        assert!(content(&doc).contains("(abcdefghijklmnop)"));
    }

    #[test]
    fn sub_write_restores_size() {
        let mut doc = doc();
        let y = doc.get_y();
        doc.sub_write(10.0, "2", 6.0, 4.0);
        assert_eq!(doc.get_font_size().0, 10.0);
        assert!((doc.get_y() - y).abs() < 1e-9);
    }

    #[test]
    fn split_text_handles_cjk() {
        let mut doc = doc();
        let lines = doc.split_text("\u{4e2d}\u{6587}\u{4e2d}\u{6587}", 25.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "\u{4e2d}\u{6587}\u{4e2d}\u{6587}");
    }
}
