//! Axis tick marks and a data-to-page coordinate grid for simple charts.

use crate::document::Document;

/// Round `val` to a "nice" number: 1, 2, 5 or 10 times a power of ten.
/// With `round` the nearest such value is chosen, otherwise the smallest
/// one not below `val`.
pub fn nice_num(val: f64, round: bool) -> f64 {
    let exp = val.log10().floor() as i32;
    let f = val / 10f64.powi(exp);
    let nf = if round {
        if f < 1.5 {
            1.0
        } else if f < 3.0 {
            2.0
        } else if f < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if f <= 1.0 {
        1.0
    } else if f <= 2.0 {
        2.0
    } else if f <= 5.0 {
        5.0
    } else {
        10.0
    };
    // Dividing by the positive power keeps results such as 1e-5 exact.
    if exp < 0 {
        nf / 10f64.powi(-exp)
    } else {
        nf * 10f64.powi(exp)
    }
}

/// Number of decimals needed to label ticks `div` apart.
pub fn tickmark_precision(div: f64) -> usize {
    (-div.log10().floor()).max(0.0) as usize
}

/// Evenly spaced tick values enclosing `min..=max` and their label
/// precision. Empty unless `max > min`.
pub fn tickmarks(min: f64, max: f64) -> (Vec<f64>, usize) {
    let mut list = Vec::new();
    if max <= min {
        return (list, 0);
    }
    let spread = nice_num(max - min, false);
    let d = nice_num(spread / 4.0, true);
    let graph_min = (min / d).floor() * d;
    let graph_max = (max / d).ceil() * d;
    let mut x = graph_min;
    while x < graph_max + 0.5 * d {
        list.push(x);
        x += d;
    }
    (list, tickmark_precision(d))
}

fn extent(min: f64, div: f64, count: usize) -> (Vec<f64>, usize) {
    let list = (0..=count).map(|j| min + div * j as f64).collect();
    (list, tickmark_precision(div))
}

/// Slope and intercept of the line through two points.
fn linear(x1: f64, y1: f64, x2: f64, y2: f64) -> (f64, f64) {
    if x2 == x1 {
        return (0.0, 0.0);
    }
    let slope = (y2 - y1) / (x2 - x1);
    (slope, y2 - x2 * slope)
}

/// Formats a tick value with the given number of decimals.
pub type TickFormatter = fn(f64, usize) -> String;

fn default_formatter(val: f64, precision: usize) -> String {
    format!("{val:.precision$}")
}

/// Maps data coordinates onto a rectangle of the page and draws its grid.
#[derive(Debug, Clone)]
pub struct Grid {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    xm: f64,
    xb: f64,
    ym: f64,
    yb: f64,
    x_ticks: Vec<f64>,
    y_ticks: Vec<f64>,
    x_precision: usize,
    y_precision: usize,
    /// Put labels inside the grid rectangle.
    pub x_label_in: bool,
    pub y_label_in: bool,
    /// Label formatters; `None` omits the labels.
    pub x_tick_str: Option<TickFormatter>,
    pub y_tick_str: Option<TickFormatter>,
    /// Subdivisions between tick marks.
    pub x_div: usize,
    pub y_div: usize,
    pub clr_main: (u8, u8, u8),
    pub clr_sub: (u8, u8, u8),
    /// Line widths in user units.
    pub wd_main: f64,
    pub wd_sub: f64,
    /// Label height in points.
    pub text_size: f64,
}

impl Grid {
    /// A grid over the page rectangle at `(x, y)` of size `w` by `h`, with
    /// unit extents on both axes.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        let mut grid = Self {
            x,
            y,
            w,
            h,
            xm: 0.0,
            xb: 0.0,
            ym: 0.0,
            yb: 0.0,
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
            x_precision: 0,
            y_precision: 0,
            x_label_in: false,
            y_label_in: false,
            x_tick_str: Some(default_formatter),
            y_tick_str: Some(default_formatter),
            x_div: 10,
            y_div: 10,
            clr_main: (128, 160, 128),
            clr_sub: (192, 224, 192),
            wd_main: 0.1,
            wd_sub: 0.1,
            text_size: 7.0,
        };
        grid.tickmarks_extent_x(0.0, 1.0, 1);
        grid.tickmarks_extent_y(0.0, 1.0, 1);
        grid
    }

    /// `count` intervals of `div` starting at `min` along the x axis.
    pub fn tickmarks_extent_x(&mut self, min: f64, div: f64, count: usize) {
        (self.x_ticks, self.x_precision) = extent(min, div, count);
        let last = self.x_ticks[count];
        (self.xm, self.xb) = linear(min, self.x, last, self.x + self.w);
    }

    pub fn tickmarks_extent_y(&mut self, min: f64, div: f64, count: usize) {
        (self.y_ticks, self.y_precision) = extent(min, div, count);
        let last = self.y_ticks[count];
        (self.ym, self.yb) = linear(min, self.y + self.h, last, self.y);
    }

    /// Nice tick marks along the x axis that contain `min..=max`.
    pub fn tickmarks_contain_x(&mut self, min: f64, max: f64) {
        let (ticks, precision) = tickmarks(min, max);
        if let (Some(&first), Some(&last)) = (ticks.first(), ticks.last()) {
            (self.xm, self.xb) = linear(first, self.x, last, self.x + self.w);
            self.x_ticks = ticks;
            self.x_precision = precision;
        }
    }

    pub fn tickmarks_contain_y(&mut self, min: f64, max: f64) {
        let (ticks, precision) = tickmarks(min, max);
        if let (Some(&first), Some(&last)) = (ticks.first(), ticks.last()) {
            (self.ym, self.yb) = linear(first, self.y + self.h, last, self.y);
            self.y_ticks = ticks;
            self.y_precision = precision;
        }
    }

    /// Page abscissa of a data value.
    pub fn x(&self, data_x: f64) -> f64 {
        self.xm * data_x + self.xb
    }

    pub fn y(&self, data_y: f64) -> f64 {
        self.ym * data_y + self.yb
    }

    pub fn xy(&self, data_x: f64, data_y: f64) -> (f64, f64) {
        (self.x(data_x), self.y(data_y))
    }

    /// Page position of a point given relative to the grid, `(0, 0)` at the
    /// lower left and `(1, 1)` at the upper right.
    pub fn pos(&self, x_rel: f64, y_rel: f64) -> (f64, f64) {
        (self.w * x_rel + self.x, self.h * (1.0 - y_rel) + self.y)
    }

    /// Page width of a data width; negative for a descending axis.
    pub fn wd(&self, data_wd: f64) -> f64 {
        data_wd * self.xm
    }

    pub fn wd_abs(&self, data_wd: f64) -> f64 {
        self.wd(data_wd).abs()
    }

    /// Page height of a data height; negative since y grows downwards.
    pub fn ht(&self, data_ht: f64) -> f64 {
        data_ht * self.ym
    }

    pub fn ht_abs(&self, data_ht: f64) -> f64 {
        self.ht(data_ht).abs()
    }

    /// First and last x tick values.
    pub fn x_range(&self) -> (f64, f64) {
        range(&self.x_ticks)
    }

    pub fn y_range(&self) -> (f64, f64) {
        range(&self.y_ticks)
    }

    pub fn x_ticks(&self) -> &[f64] {
        &self.x_ticks
    }

    pub fn y_ticks(&self) -> &[f64] {
        &self.y_ticks
    }

    /// Draw grid lines and tick labels. The document's line width, colors,
    /// font size, cell margin and page break setting are restored
    /// afterwards. Labels need a font to be selected.
    pub fn grid(&self, doc: &mut Document) {
        let (x_len, y_len) = (self.x_ticks.len(), self.y_ticks.len());
        if x_len < 2 || y_len < 2 || !doc.ok() {
            return;
        }
        let saved_draw = doc.get_draw_color();
        let saved_fill = doc.get_fill_color();
        let saved_width = doc.get_line_width();
        let (saved_size, _) = doc.get_font_size();
        let saved_margin = doc.get_cell_margin();
        let (saved_auto, saved_bottom) = doc.get_auto_page_break();

        let line = |doc: &mut Document, x1: f64, y1: f64, x2: f64, y2: f64, heavy: bool| {
            let ((r, g, b), wd) = if heavy {
                (self.clr_main, self.wd_main)
            } else {
                (self.clr_sub, self.wd_sub)
            };
            doc.set_line_width(wd);
            doc.set_draw_color(r, g, b);
            doc.line(x1, y1, x2, y2);
        };

        let text_sz = doc.point_to_unit(self.text_size);
        let half = text_sz / 2.0;
        doc.set_auto_page_break(false, 0.0);
        doc.set_font_unit_size(text_sz);
        let str_ofs = doc.get_string_width("0");
        doc.set_fill_color(255, 255, 255);
        doc.set_cell_margin(0.0);

        let (x_min, x_max) = self.x_range();
        let (y_min, y_max) = self.y_range();
        let (lf, rt) = (self.x(x_min), self.x(x_max));
        let (bt, tp) = (self.y(y_min), self.y(y_max));

        let mut x_div = self.x_ticks[1] - self.x_ticks[0];
        if self.x_div > 0 {
            x_div /= self.x_div as f64;
        }
        let x_div = self.wd(x_div);
        for (j, &x) in self.x_ticks.iter().enumerate() {
            let mut draw_x = self.x(x);
            line(doc, draw_x, tp, draw_x, bt, true);
            if j < x_len - 1 {
                for _ in 1..self.x_div {
                    draw_x += x_div;
                    line(doc, draw_x, tp, draw_x, bt, false);
                }
            }
        }

        let mut y_div = self.y_ticks[1] - self.y_ticks[0];
        if self.y_div > 0 {
            y_div /= self.y_div as f64;
        }
        let y_div = self.ht(y_div);
        for (j, &y) in self.y_ticks.iter().enumerate() {
            let mut draw_y = self.y(y);
            line(doc, lf, draw_y, rt, draw_y, true);
            if j < y_len - 1 {
                for _ in 1..self.y_div {
                    draw_y += y_div;
                    line(doc, lf, draw_y, rt, draw_y, false);
                }
            }
        }

        if let Some(format) = self.x_tick_str {
            for &x in &self.x_ticks {
                let label = format(x, self.x_precision);
                let wd = doc.get_string_width(&label);
                let draw_x = self.x(x) - wd / 2.0;
                if self.x_label_in {
                    doc.set_xy(draw_x, bt - text_sz - str_ofs);
                } else {
                    doc.set_xy(draw_x, bt + str_ofs);
                }
                doc.cell_format(wd, text_sz, &label, "", Default::default(), "L", true);
            }
        }

        if let Some(format) = self.y_tick_str {
            for &y in &self.y_ticks {
                let label = format(y, self.y_precision);
                let wd = doc.get_string_width(&label);
                if self.y_label_in {
                    doc.set_xy(lf + str_ofs, self.y(y) - half);
                } else {
                    doc.set_xy(lf - str_ofs - wd, self.y(y) - half);
                }
                doc.cell_format(wd, text_sz, &label, "", Default::default(), "L", true);
            }
        }

        doc.set_line_width(saved_width);
        doc.set_draw_color(saved_draw.0, saved_draw.1, saved_draw.2);
        doc.set_fill_color(saved_fill.0, saved_fill.1, saved_fill.2);
        doc.set_font_size(saved_size);
        doc.set_cell_margin(saved_margin);
        doc.set_auto_page_break(saved_auto, saved_bottom);
    }

    /// Plot `f` over `x_min..=x_max` as `count` line segments.
    pub fn plot(
        &self,
        doc: &mut Document,
        x_min: f64,
        x_max: f64,
        count: usize,
        f: impl Fn(f64) -> f64,
    ) {
        if !doc.ok() || count == 0 {
            return;
        }
        let delta = (x_max - x_min) / count as f64;
        let mut prev = self.xy(x_min, f(x_min));
        for j in 1..=count {
            let x = x_min + delta * j as f64;
            let next = self.xy(x, f(x));
            doc.line(prev.0, prev.1, next.0, next.1);
            prev = next;
        }
    }
}

fn range(ticks: &[f64]) -> (f64, f64) {
    match (ticks.first(), ticks.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => (0.0, 0.0),
    }
}
