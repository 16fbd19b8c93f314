//! Named CMYK spot colors, written as `/Separation` color spaces.

use super::{Color, Document};
use crate::error::PdfError;

/// CMYK components, each in percent (`0..=100`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cmyk {
    pub c: u8,
    pub m: u8,
    pub y: u8,
    pub k: u8,
}

/// A registered spot color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotColor {
    id: usize,
    val: Cmyk,
    object: usize,
}

impl SpotColor {
    /// 1-based registration order, used in the `/CS{id}` resource name.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn cmyk(&self) -> Cmyk {
        self.val
    }
}

fn clamp(v: u8) -> u8 {
    v.min(100)
}

impl Document {
    /// Register a spot color. Components above 100 are clamped; a name may
    /// only be registered once.
    pub fn add_spot_color(&mut self, name: &str, c: u8, m: u8, y: u8, k: u8) {
        if self.err.is_some() {
            return;
        }
        if self.spot_colors.contains_key(name) {
            self.set_error(PdfError::DuplicateSpotColor(name.to_string()));
            return;
        }
        let id = self.spot_colors.len() + 1;
        self.spot_colors.insert(
            name.to_string(),
            SpotColor {
                id,
                val: Cmyk {
                    c: clamp(c),
                    m: clamp(m),
                    y: clamp(y),
                    k: clamp(k),
                },
                object: 0,
            },
        );
    }

    /// A registered spot color by name.
    pub fn spot_color(&self, name: &str) -> Option<&SpotColor> {
        self.spot_colors.get(name)
    }

    fn lookup_spot_color(&mut self, name: &str) -> Option<usize> {
        if self.err.is_some() {
            return None;
        }
        match self.spot_colors.get(name) {
            Some(spot) => Some(spot.id),
            None => {
                self.set_error(PdfError::UnknownSpotColor(name.to_string()));
                None
            }
        }
    }

    /// Stroke with a spot color at `tint` percent.
    pub fn set_draw_spot_color(&mut self, name: &str, tint: u8) {
        let Some(id) = self.lookup_spot_color(name) else {
            return;
        };
        self.draw_color = spot_color(name, id, tint, "CS", "SCN");
        if self.page > 0 {
            let op = self.draw_color.op.clone();
            self.out(&op);
        }
    }

    /// Fill with a spot color at `tint` percent.
    pub fn set_fill_spot_color(&mut self, name: &str, tint: u8) {
        let Some(id) = self.lookup_spot_color(name) else {
            return;
        };
        self.fill_color = spot_color(name, id, tint, "cs", "scn");
        self.color_flag = self.fill_color.op != self.text_color.op;
        if self.page > 0 {
            let op = self.fill_color.op.clone();
            self.out(&op);
        }
    }

    /// Text in a spot color at `tint` percent.
    pub fn set_text_spot_color(&mut self, name: &str, tint: u8) {
        let Some(id) = self.lookup_spot_color(name) else {
            return;
        };
        self.text_color = spot_color(name, id, tint, "cs", "scn");
        self.color_flag = self.fill_color.op != self.text_color.op;
    }

    fn current_spot(&self, color: &Color) -> Option<(String, Cmyk)> {
        let name = color.spot.as_ref()?;
        let spot = self.spot_colors.get(name)?;
        Some((name.clone(), spot.val))
    }

    /// Name and components of the stroke color, if it is a spot color.
    pub fn get_draw_spot_color(&self) -> Option<(String, Cmyk)> {
        self.current_spot(&self.draw_color)
    }

    pub fn get_fill_spot_color(&self) -> Option<(String, Cmyk)> {
        self.current_spot(&self.fill_color)
    }

    pub fn get_text_spot_color(&self) -> Option<(String, Cmyk)> {
        self.current_spot(&self.text_color)
    }

    pub(crate) fn put_spot_colors(&mut self) {
        for j in 0..self.spot_colors.len() {
            let n = self.newobj();
            let Some((name, spot)) = self.spot_colors.get_index_mut(j) else {
                continue;
            };
            spot.object = n;
            let v = spot.val;
            let name = name.replace(' ', "#20");
            self.put(&format!("[/Separation /{name}"));
            self.put("/DeviceCMYK <<");
            self.put("/Range [0 1 0 1 0 1 0 1] /C0 [0 0 0 0] ");
            self.put(&format!(
                "/C1 [{:.3} {:.3} {:.3} {:.3}] ",
                f64::from(v.c) / 100.0,
                f64::from(v.m) / 100.0,
                f64::from(v.y) / 100.0,
                f64::from(v.k) / 100.0
            ));
            self.put("/FunctionType 2 /Domain [0 1] /N 1>>]");
            self.put("endobj");
        }
    }

    pub(crate) fn put_spot_color_resources(&mut self) {
        self.put("/ColorSpace <<");
        let entries: Vec<String> = self
            .spot_colors
            .values()
            .map(|spot| format!("/CS{} {} 0 R", spot.id, spot.object))
            .collect();
        for entry in entries {
            self.put(&entry);
        }
        self.put(">>");
    }
}

fn spot_color(name: &str, id: usize, tint: u8, space_op: &str, color_op: &str) -> Color {
    Color {
        rgb: (0, 0, 0),
        spot: Some(name.to_string()),
        op: format!(
            "/CS{id} {space_op} {:.3} {color_op}",
            f64::from(clamp(tint)) / 100.0
        ),
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

    #[test]
    fn components_are_clamped() {
        let mut doc = doc();
        doc.add_spot_color("PANTONE 145 CVC", 0, 42, 255, 101);
        let spot = doc.spot_color("PANTONE 145 CVC").unwrap();
        assert_eq!(spot.cmyk(), Cmyk { c: 0, m: 42, y: 100, k: 100 });
        assert_eq!(spot.id(), 1);
    }

    #[test]
    fn duplicate_keeps_original() {
        let mut doc = doc();
        doc.add_spot_color("A", 10, 20, 30, 40);
        doc.add_spot_color("A", 1, 1, 1, 1);
        assert!(matches!(doc.error(), Some(PdfError::DuplicateSpotColor(_))));
        assert_eq!(doc.spot_color("A").unwrap().cmyk().c, 10);
    }

    #[test]
    fn operators() {
        let mut doc = doc();
        doc.add_spot_color("A", 10, 20, 30, 40);
        doc.add_spot_color("B", 0, 0, 0, 100);
        doc.set_draw_spot_color("A", 50);
        doc.set_fill_spot_color("B", 200);
        let content = String::from_utf8(doc.pages[1].clone()).unwrap();
        assert_eq!(content, "/CS1 CS 0.500 SCN\n/CS2 cs 1.000 scn\n");
        let (name, cmyk) = doc.get_draw_spot_color().unwrap();
        assert_eq!(name, "A");
        assert_eq!(cmyk.k, 40);
        assert!(doc.get_text_spot_color().is_none());
    }

    #[test]
    fn unknown_name_latches() {
        let mut doc = doc();
        doc.set_text_spot_color("missing", 100);
        assert!(matches!(doc.error(), Some(PdfError::UnknownSpotColor(_))));
    }
}
