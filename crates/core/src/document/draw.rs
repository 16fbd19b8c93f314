//! Colors, line style, shapes and transparency.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::{BlendState, Color, Document, PdfVersion};
use crate::error::{PdfError, Result};
use crate::utils::Point;

/// Separable and non-separable blend modes of the transparency model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(BlendMode::Normal);
        }
        BlendMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| PdfError::InvalidArgument(format!("unrecognized blend mode \"{s}\"")))
    }
}

/// Path painting operator for a style string: `D` strokes, `F` fills, `DF`
/// or `FD` does both; a trailing `*` selects the even-odd rule.
pub(crate) fn fill_draw_op(style: &str) -> String {
    match style.to_uppercase().as_str() {
        "" | "D" => "S".into(),
        "F" => "f".into(),
        "FD" | "DF" => "B".into(),
        "F*" => "f*".into(),
        "FD*" | "DF*" => "B*".into(),
        _ => style.to_string(),
    }
}

impl Document {
    /// Stroke color, `0..=255` per channel.
    pub fn set_draw_color(&mut self, r: u8, g: u8, b: u8) {
        self.draw_color = Color::rgb(r, g, b, "G", "RG");
        if self.page > 0 {
            let op = self.draw_color.op.clone();
            self.out(&op);
        }
    }

    pub fn get_draw_color(&self) -> (u8, u8, u8) {
        self.draw_color.rgb
    }

    /// Fill color for shapes and cell backgrounds.
    pub fn set_fill_color(&mut self, r: u8, g: u8, b: u8) {
        self.fill_color = Color::rgb(r, g, b, "g", "rg");
        self.color_flag = self.fill_color.op != self.text_color.op;
        if self.page > 0 {
            let op = self.fill_color.op.clone();
            self.out(&op);
        }
    }

    pub fn get_fill_color(&self) -> (u8, u8, u8) {
        self.fill_color.rgb
    }

    /// Text color; applied when text is written.
    pub fn set_text_color(&mut self, r: u8, g: u8, b: u8) {
        self.text_color = Color::rgb(r, g, b, "g", "rg");
        self.color_flag = self.fill_color.op != self.text_color.op;
    }

    pub fn get_text_color(&self) -> (u8, u8, u8) {
        self.text_color.rgb
    }

    /// Line width in user units.
    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
        if self.page > 0 {
            self.out(&format!("{:.2} w", width * self.k));
        }
    }

    pub fn get_line_width(&self) -> f64 {
        self.line_width
    }

    /// `butt` (default), `round` or `square`.
    pub fn set_line_cap_style(&mut self, style: &str) {
        self.cap_style = match style {
            "round" => 1,
            "square" => 2,
            _ => 0,
        };
        if self.page > 0 {
            self.out(&format!("{} J", self.cap_style));
        }
    }

    /// `miter` (default), `round` or `bevel`.
    pub fn set_line_join_style(&mut self, style: &str) {
        self.join_style = match style {
            "round" => 1,
            "bevel" => 2,
            _ => 0,
        };
        if self.page > 0 {
            self.out(&format!("{} j", self.join_style));
        }
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        if self.err.is_some() {
            return;
        }
        let (k, h) = (self.k, self.h);
        self.out(&format!(
            "{:.2} {:.2} m {:.2} {:.2} l S",
            x1 * k,
            (h - y1) * k,
            x2 * k,
            (h - y2) * k
        ));
    }

    /// Rectangle with its upper left corner at `(x, y)`.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &str) {
        if self.err.is_some() {
            return;
        }
        let k = self.k;
        self.out(&format!(
            "{:.2} {:.2} {:.2} {:.2} re {}",
            x * k,
            (self.h - y) * k,
            w * k,
            -h * k,
            fill_draw_op(style)
        ));
    }

    pub fn circle(&mut self, x: f64, y: f64, r: f64, style: &str) {
        self.ellipse(x, y, r, r, 0.0, style);
    }

    /// Ellipse centered at `(x, y)`, rotated counter-clockwise by
    /// `deg_rotate` degrees.
    pub fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, deg_rotate: f64, style: &str) {
        self.arc(x, y, rx, ry, deg_rotate, 0.0, 360.0, style);
    }

    /// Elliptical arc from `deg_start` to `deg_end`, approximated with one
    /// cubic Bezier segment per 60 degrees (at least two).
    #[allow(clippy::too_many_arguments)]
    pub fn arc(
        &mut self,
        x: f64,
        y: f64,
        rx: f64,
        ry: f64,
        deg_rotate: f64,
        deg_start: f64,
        deg_end: f64,
        style: &str,
    ) {
        if self.err.is_some() {
            return;
        }
        let k = self.k;
        let mut cx = x * k;
        let mut cy = (self.h - y) * k;
        let (rx, ry) = (rx * k, ry * k);
        let segments = (((deg_end - deg_start) as i64) / 60).max(2);
        let angle_start = deg_start * PI / 180.0;
        let angle_end = deg_end * PI / 180.0;
        let dt = (angle_end - angle_start) / segments as f64;
        let dtm = dt / 3.0;
        if deg_rotate != 0.0 {
            let a = -deg_rotate * PI / 180.0;
            self.out(&format!(
                "q {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} cm",
                a.cos(),
                -a.sin(),
                a.sin(),
                a.cos(),
                cx,
                cy
            ));
            cx = 0.0;
            cy = 0.0;
        }
        let t = angle_start;
        let mut a0 = cx + rx * t.cos();
        let mut b0 = cy + ry * t.sin();
        let mut c0 = -rx * t.sin();
        let mut d0 = ry * t.cos();
        self.out(&format!("{:.2} {:.2} m", a0, b0));
        for j in 1..=segments {
            let t = j as f64 * dt + angle_start;
            let a1 = cx + rx * t.cos();
            let b1 = cy + ry * t.sin();
            let c1 = -rx * t.sin();
            let d1 = ry * t.cos();
            self.out(&format!(
                "{:.5} {:.5} {:.5} {:.5} {:.5} {:.5} c",
                a0 + c0 * dtm,
                b0 + d0 * dtm,
                a1 - c1 * dtm,
                b1 - d1 * dtm,
                a1,
                b1
            ));
            (a0, b0, c0, d0) = (a1, b1, c1, d1);
        }
        self.out(&fill_draw_op(style));
        if deg_rotate != 0.0 {
            self.out("Q");
        }
    }

    /// Quadratic Bezier curve from `(x0, y0)` to `(x1, y1)` with control
    /// point `(cx, cy)`.
    #[allow(clippy::too_many_arguments)]
    pub fn curve(&mut self, x0: f64, y0: f64, cx: f64, cy: f64, x1: f64, y1: f64, style: &str) {
        if self.err.is_some() {
            return;
        }
        let (k, h) = (self.k, self.h);
        self.out(&format!("{:.2} {:.2} m", x0 * k, (h - y0) * k));
        self.out(&format!(
            "{:.5} {:.5} {:.5} {:.5} v {}",
            cx * k,
            (h - cy) * k,
            x1 * k,
            (h - y1) * k,
            fill_draw_op(style)
        ));
    }

    /// Cubic Bezier curve from `(x0, y0)` to `(x1, y1)`; `(cx0, cy0)` is
    /// the control point of the start, `(cx1, cy1)` that of the end.
    #[allow(clippy::too_many_arguments)]
    pub fn curve_cubic(
        &mut self,
        x0: f64,
        y0: f64,
        cx0: f64,
        cy0: f64,
        x1: f64,
        y1: f64,
        cx1: f64,
        cy1: f64,
        style: &str,
    ) {
        if self.err.is_some() {
            return;
        }
        let (k, h) = (self.k, self.h);
        self.out(&format!("{:.2} {:.2} m", x0 * k, (h - y0) * k));
        self.out(&format!(
            "{:.5} {:.5} {:.5} {:.5} {:.5} {:.5} c {}",
            cx0 * k,
            (h - cy0) * k,
            cx1 * k,
            (h - cy1) * k,
            x1 * k,
            (h - y1) * k,
            fill_draw_op(style)
        ));
    }

    /// Closed polygon through `points`; fewer than three points draw
    /// nothing.
    pub fn polygon(&mut self, points: &[Point], style: &str) {
        if self.err.is_some() || points.len() < 3 {
            return;
        }
        let (k, h) = (self.k, self.h);
        let first = points[0];
        self.out(&format!("{:.5} {:.5} m", first.x * k, (h - first.y) * k));
        for p in &points[1..] {
            self.out(&format!("{:.5} {:.5} l", p.x * k, (h - p.y) * k));
        }
        self.out(&format!("{:.5} {:.5} l", first.x * k, (h - first.y) * k));
        self.out(&fill_draw_op(style));
    }

    /// Set stroke and fill opacity (`0.0..=1.0`) and the blend mode for
    /// subsequent drawing. Requires PDF 1.4.
    pub fn set_alpha(&mut self, alpha: f64, mode: BlendMode) {
        if self.err.is_some() {
            return;
        }
        if !(0.0..=1.0).contains(&alpha) {
            self.set_error(PdfError::InvalidArgument(format!(
                "alpha value (0.0 - 1.0) is out of range: {alpha:.3}"
            )));
            return;
        }
        self.require_version(PdfVersion::V1_4);
        let alpha_str = format!("{alpha:.3}");
        let key = format!("{alpha_str} {mode}");
        let pos = match self.blend_map.get(&key) {
            Some(&pos) => pos,
            None => {
                self.blend_list.push(BlendState {
                    fill_alpha: alpha_str.clone(),
                    stroke_alpha: alpha_str,
                    mode,
                    object: 0,
                });
                let pos = self.blend_list.len();
                self.blend_map.insert(key, pos);
                pos
            }
        };
        self.out(&format!("/GS{pos} gs"));
    }

    pub(crate) fn put_blend_modes(&mut self) {
        for j in 0..self.blend_list.len() {
            let n = self.newobj();
            let state = &self.blend_list[j];
            let line = format!(
                "<</Type /ExtGState /ca {} /CA {} /BM /{}>>",
                state.fill_alpha, state.stroke_alpha, state.mode
            );
            self.put(&line);
            self.put("endobj");
            self.blend_list[j].object = n;
        }
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
        doc.pages[1].clear();
        doc
    }

    fn content(doc: &Document) -> String {
        String::from_utf8(doc.pages[1].clone()).unwrap()
    }

    #[test]
    fn line_flips_y_axis() {
        let mut doc = doc();
        doc.line(10.0, 20.0, 30.0, 40.0);
        assert_eq!(content(&doc), "10.00 821.89 m 30.00 801.89 l S\n");
    }

    #[test]
    fn rect_styles() {
        let mut doc = doc();
        doc.rect(0.0, 0.0, 10.0, 5.0, "FD");
        doc.rect(0.0, 0.0, 10.0, 5.0, "");
        assert_eq!(
            content(&doc),
            "0.00 841.89 10.00 -5.00 re B\n0.00 841.89 10.00 -5.00 re S\n"
        );
    }

    #[test]
    fn circle_uses_six_segments() {
        let mut doc = doc();
        doc.circle(100.0, 100.0, 10.0, "F");
        let text = content(&doc);
        assert_eq!(text.matches(" c\n").count(), 6);
        assert!(text.ends_with("f\n"));
    }

    #[test]
    fn polygon_needs_three_points() {
        let mut doc = doc();
        doc.polygon(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], "D");
        assert!(content(&doc).is_empty());
        doc.polygon(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)],
            "D",
        );
        assert_eq!(content(&doc).lines().count(), 5);
    }

    #[test]
    fn alpha_states_are_shared() {
        let mut doc = doc();
        doc.set_alpha(0.5, BlendMode::Multiply);
        doc.set_alpha(1.0, BlendMode::Normal);
        doc.set_alpha(0.5, BlendMode::Multiply);
        assert_eq!(content(&doc), "/GS1 gs\n/GS2 gs\n/GS1 gs\n");
        assert_eq!(doc.version(), PdfVersion::V1_4);
        assert_eq!(doc.blend_list.len(), 2);
    }

    #[test]
    fn alpha_out_of_range() {
        let mut doc = doc();
        doc.set_alpha(1.5, BlendMode::Normal);
        assert!(matches!(doc.error(), Some(PdfError::InvalidArgument(_))));
    }

    #[test]
    fn blend_mode_names() {
        assert_eq!("ColorDodge".parse::<BlendMode>().unwrap(), BlendMode::ColorDodge);
        assert_eq!("".parse::<BlendMode>().unwrap(), BlendMode::Normal);
        assert!("Bogus".parse::<BlendMode>().is_err());
    }

    #[test]
    fn fill_color_sets_flag() {
        let mut doc = doc();
        doc.set_fill_color(255, 0, 0);
        assert!(doc.color_flag);
        doc.set_text_color(255, 0, 0);
        assert!(!doc.color_flag);
        assert_eq!(content(&doc), "1.000 0.000 0.000 rg\n");
    }
}
