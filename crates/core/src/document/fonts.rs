//! Font selection and embedding.

use std::io::Read;
use std::sync::Arc;

use tracing::trace;

use super::Document;
use crate::error::{PdfError, Result};
use crate::font::{FontDef, FontType, core_font, font_key, is_core_family};
use crate::utils::sha1_hex;

/// Split `U` (underline) and `S` (strike-out) out of a style string,
/// returning the normalized style (`""`, `B`, `I` or `BI`).
fn parse_style(style: &str) -> (String, bool, bool) {
    let upper = style.to_uppercase();
    let underline = upper.contains('U');
    let strikeout = upper.contains('S');
    let mut style: String = upper.chars().filter(|c| *c == 'B' || *c == 'I').collect();
    if style == "IB" {
        style = "BI".into();
    }
    (style, underline, strikeout)
}

impl Document {
    /// Select the font for subsequent text.
    ///
    /// `family` is a core family (`courier`, `helvetica` or its alias
    /// `arial`, `times`, `symbol`, `zapfdingbats`) or one added with
    /// [`Document::add_font`]; empty keeps the current family. `style`
    /// combines `B`, `I`, `U` and `S`. A `size` of zero keeps the current
    /// size in points.
    pub fn set_font(&mut self, family: &str, style: &str, size: f64) {
        if self.err.is_some() {
            return;
        }
        let mut family = family.to_lowercase();
        if family.is_empty() {
            family = self.font_family.clone();
        }
        if family == "arial" {
            family = "helvetica".into();
        }
        let (mut style, underline, strikeout) = parse_style(style);
        self.underline = underline;
        self.strikeout = strikeout;
        let size = if size == 0.0 { self.font_size_pt } else { size };

        if self.font_family == family
            && self.font_style == style
            && self.font_size_pt == size
            && self.current_font.is_some()
        {
            return;
        }

        let mut key = font_key(&family, &style);
        if !self.fonts.contains(&key) {
            if family == "symbol" || family == "zapfdingbats" {
                style.clear();
                key = font_key(&family, "");
            }
            if !self.fonts.contains(&key) {
                if !is_core_family(&family) {
                    self.set_error(PdfError::UndefinedFont { family, style });
                    return;
                }
                let Some(core) = core_font(&key) else {
                    self.set_error(PdfError::CoreFontNotFound(format!("{key}.json")));
                    return;
                };
                trace!(font = %key, "core font loaded");
                self.fonts
                    .insert(key.clone(), core.def.clone(), core.id.clone(), None);
            }
        }

        self.font_family = family;
        self.font_style = style;
        self.font_size_pt = size;
        self.font_size = size / self.k;
        self.current_font = self.fonts.get(&key).cloned();
        self.select_font();
    }

    fn select_font(&mut self) {
        if self.page > 0
            && let Some(font) = &self.current_font
        {
            let line = format!("BT /F{} {:.2} Tf ET", font.id, self.font_size_pt);
            self.out(&line);
        }
    }

    /// Font size in points.
    pub fn set_font_size(&mut self, size: f64) {
        if self.err.is_some() || self.font_size_pt == size {
            return;
        }
        self.font_size_pt = size;
        self.font_size = size / self.k;
        self.select_font();
    }

    /// Font size in user units.
    pub fn set_font_unit_size(&mut self, size: f64) {
        if self.err.is_some() || self.font_size == size {
            return;
        }
        self.font_size_pt = size * self.k;
        self.font_size = size;
        self.select_font();
    }

    /// Change the style of the current font.
    pub fn set_font_style(&mut self, style: &str) {
        let family = self.font_family.clone();
        self.set_font(&family, style, self.font_size_pt);
    }

    /// Font size in points and in user units.
    pub fn get_font_size(&self) -> (f64, f64) {
        (self.font_size_pt, self.font_size)
    }

    /// Register a font from a definition file read through the font loader.
    /// An empty `file` defaults to the family without spaces followed by the
    /// lower-cased style, e.g. `dejavusansb.json`.
    pub fn add_font(&mut self, family: &str, style: &str, file: &str) {
        if self.err.is_some() {
            return;
        }
        let file = if file.is_empty() {
            format!("{}{}.json", family.replace(' ', ""), style.to_lowercase())
        } else {
            file.to_string()
        };
        let result = self
            .font_loader
            .open(&file)
            .map_err(|e| PdfError::FontDefinition(format!("cannot open {file}: {e}")));
        match result {
            Ok(reader) => self.add_font_from_reader(family, style, reader),
            Err(err) => self.set_error(err),
        }
    }

    /// Register a font from a definition read from `reader`. The program
    /// named in the definition is read through the font loader at output.
    pub fn add_font_from_reader(&mut self, family: &str, style: &str, mut reader: impl Read) {
        if self.err.is_some() {
            return;
        }
        let mut json = Vec::new();
        if let Err(err) = reader.read_to_end(&mut json) {
            self.set_error(err.into());
            return;
        }
        self.register_font(family, style, &json, None);
    }

    /// Register a font from an in-memory definition and, optionally, its
    /// program bytes.
    pub fn add_font_from_bytes(
        &mut self,
        family: &str,
        style: &str,
        json: &[u8],
        program: Option<&[u8]>,
    ) {
        if self.err.is_some() {
            return;
        }
        self.register_font(family, style, json, program.map(<[u8]>::to_vec));
    }

    fn register_font(&mut self, family: &str, style: &str, json: &[u8], program: Option<Vec<u8>>) {
        let (style, _, _) = parse_style(style);
        let key = font_key(family, &style);
        if self.fonts.contains(&key) {
            return;
        }
        match FontDef::from_json(json) {
            Ok(def) => {
                trace!(font = %key, name = %def.name, "font definition loaded");
                self.fonts
                    .insert(key, Arc::new(def), sha1_hex(json), program);
            }
            Err(err) => self.set_error(err),
        }
    }

    fn read_font_program(&self, file: &str) -> Result<Vec<u8>> {
        let mut reader = self.font_loader.open(file)?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn put_fonts(&mut self) -> Result<()> {
        let nf = self.n;
        for diff in self.fonts.diffs().to_vec() {
            self.newobj();
            self.put(&format!(
                "<</Type /Encoding /BaseEncoding /WinAnsiEncoding /Differences [{diff}]>>"
            ));
            self.put("endobj");
        }

        let files: Vec<_> = self
            .fonts
            .files()
            .map(|(name, file)| (name.to_string(), file.clone()))
            .collect();
        for (name, file) in files {
            let mut program = match &file.content {
                Some(content) => content.as_ref().clone(),
                None => self.read_font_program(&name)?,
            };
            let compressed = name.ends_with(".z");
            if !compressed && file.length2 != 0 {
                // PFB segments: skip the 6-byte headers.
                let l1 = usize::try_from(file.length1).unwrap_or(0);
                let l2 = usize::try_from(file.length2).unwrap_or(0);
                let end = (6 + l1 + 6 + l2).min(program.len());
                if 6 + l1 + 6 > end {
                    return Err(PdfError::FontDefinition(format!(
                        "font program {name} is truncated"
                    )));
                }
                let mut joined = program[6..6 + l1].to_vec();
                joined.extend_from_slice(&program[6 + l1 + 6..end]);
                program = joined;
            }
            let n = self.newobj();
            self.font_file_objects.insert(name, n);
            self.put(&format!("<</Length {}", program.len()));
            if compressed {
                self.put("/Filter /FlateDecode");
            }
            self.put(&format!("/Length1 {}", file.length1));
            if file.length2 != 0 {
                self.put(&format!("/Length2 {} /Length3 0", file.length2));
            }
            self.put(">>");
            self.put_stream(&program);
            self.put("endobj");
        }

        let fonts: Vec<_> = self
            .fonts
            .fonts()
            .map(|(key, font)| (key.to_string(), font.clone()))
            .collect();
        for (key, font) in fonts {
            let def = &font.def;
            let n = self.newobj();
            self.font_objects.insert(key, n);
            self.put("<</Type /Font");
            self.put(&format!("/BaseFont /{}", def.name));
            match def.tp {
                FontType::Core => {
                    self.put("/Subtype /Type1");
                    if !def.is_symbolic() {
                        self.put("/Encoding /WinAnsiEncoding");
                    }
                    self.put(">>");
                    self.put("endobj");
                }
                FontType::TrueType | FontType::Type1 => {
                    self.put(&format!("/Subtype /{}", def.tp.as_str()));
                    self.put("/FirstChar 32 /LastChar 255");
                    self.put(&format!("/Widths {} 0 R", n + 1));
                    self.put(&format!("/FontDescriptor {} 0 R", n + 2));
                    if font.diff_n > 0 {
                        self.put(&format!("/Encoding {} 0 R", nf + font.diff_n));
                    } else {
                        self.put("/Encoding /WinAnsiEncoding");
                    }
                    self.put(">>");
                    self.put("endobj");

                    self.newobj();
                    let widths: String = def.cw[32..256].iter().map(|w| format!("{w} ")).collect();
                    self.put(&format!("[{widths}]"));
                    self.put("endobj");

                    self.newobj();
                    let d = &def.desc;
                    let mut s = format!("<</Type /FontDescriptor /FontName /{} ", def.name);
                    s.push_str(&format!("/Ascent {} ", d.ascent));
                    s.push_str(&format!("/Descent {} ", d.descent));
                    s.push_str(&format!("/CapHeight {} ", d.cap_height));
                    s.push_str(&format!("/Flags {} ", d.flags));
                    s.push_str(&format!(
                        "/FontBBox [{} {} {} {}] ",
                        d.font_bbox.xmin, d.font_bbox.ymin, d.font_bbox.xmax, d.font_bbox.ymax
                    ));
                    s.push_str(&format!("/ItalicAngle {} ", d.italic_angle));
                    s.push_str(&format!("/StemV {} ", d.stem_v));
                    s.push_str(&format!("/MissingWidth {} ", d.missing_width));
                    if let Some(file_n) = self.font_file_objects.get(&def.file) {
                        let suffix = if def.tp == FontType::Type1 { "" } else { "2" };
                        s.push_str(&format!("/FontFile{suffix} {file_n} 0 R"));
                    }
                    s.push_str(">>");
                    self.put(&s);
                    self.put("endobj");
                }
            }
        }
        Ok(())
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
        doc
    }

    #[test]
    fn style_flags() {
        assert_eq!(parse_style("ibu"), ("BI".to_string(), true, false));
        assert_eq!(parse_style("S"), (String::new(), false, true));
    }

    #[test]
    fn arial_is_helvetica() {
        let mut doc = doc();
        doc.set_font("Arial", "B", 10.0);
        assert!(doc.ok());
        assert_eq!(doc.font_family, "helvetica");
        assert_eq!(doc.current_font.as_ref().unwrap().def.name, "Helvetica-Bold");
        let content = String::from_utf8(doc.pages[1].clone()).unwrap();
        assert!(content.ends_with(" 10.00 Tf ET\n"));
    }

    #[test]
    fn symbol_ignores_style() {
        let mut doc = doc();
        doc.set_font("Symbol", "B", 12.0);
        assert!(doc.ok());
        assert_eq!(doc.font_style, "");
        assert_eq!(doc.fonts.len(), 1);
    }

    #[test]
    fn unknown_family_latches() {
        let mut doc = doc();
        doc.set_font("nonesuch", "", 12.0);
        assert!(matches!(doc.error(), Some(PdfError::UndefinedFont { .. })));
    }

    #[test]
    fn font_size_in_units() {
        let mut doc = Document::with_options(DocumentOptions::default());
        doc.set_font("times", "", 12.0);
        doc.set_font_unit_size(10.0);
        let (pt, unit) = doc.get_font_size();
        assert!((pt - 10.0 * 72.0 / 25.4).abs() < 1e-9);
        assert_eq!(unit, 10.0);
    }

    #[test]
    fn custom_font_from_bytes() {
        let mut def = (*core_font("helvetica").unwrap().def).clone();
        def.tp = FontType::TrueType;
        def.name = "Custom".into();
        def.file = "custom.z".into();
        def.original_size = 3;
        let json = serde_json::to_vec(&def).unwrap();
        let mut doc = doc();
        doc.add_font_from_bytes("Custom", "", &json, Some(&[1, 2, 3]));
        doc.set_font("custom", "", 9.0);
        assert!(doc.ok());
        assert_eq!(doc.current_font.as_ref().unwrap().def.name, "Custom");
    }
}
