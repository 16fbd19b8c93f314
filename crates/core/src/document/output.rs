//! Finalizing the document and writing the file.
//!
//! Object layout: 1 is the page tree root and 2 the shared resource
//! dictionary, both written out of order once their contents are known.
//! Pages and their content streams follow from 3 on, then resources, the
//! information dictionary, the catalog, the cross-reference table and the
//! trailer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use time::OffsetDateTime;
use tracing::debug;

use super::{DocState, Document, LayoutMode, Orientation, ZoomMode};
use crate::codec::flate;
use crate::error::Result;
use crate::utils::{escape, replace_bytes};

fn pdf_date(date: OffsetDateTime) -> String {
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second()
    )
}

impl Document {
    /// Finish the last page (running the footer) and assemble the file.
    /// A document without pages gets an empty one. Calling it again has no
    /// effect.
    pub fn close(&mut self) {
        if self.err.is_some() || self.state == DocState::Closed {
            return;
        }
        if self.page == 0 {
            self.add_page();
            if self.err.is_some() {
                return;
            }
        }
        self.run_footer();
        self.end_page();
        if let Err(err) = self.enddoc() {
            self.set_error(err);
        }
    }

    /// Close the document and write it to `w`. Nothing is written when an
    /// error is latched; the error is returned instead.
    pub fn output(&mut self, w: &mut impl Write) -> Result<()> {
        self.close();
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        w.write_all(&self.buffer)?;
        Ok(())
    }

    /// Close the document and write it to a file at `path`.
    pub fn output_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.close();
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.output(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Close the document and return the file contents.
    pub fn output_bytes(&mut self) -> Result<Vec<u8>> {
        self.close();
        match &self.err {
            Some(err) => Err(err.clone()),
            None => Ok(self.buffer.clone()),
        }
    }

    fn enddoc(&mut self) -> Result<()> {
        self.layer_end_doc();
        debug!(pages = self.page_count(), version = %self.version, "finalizing document");
        self.buffer.clear();
        self.put(&format!("%PDF-{}", self.version));
        self.put_pages()?;
        self.put_resources()?;

        self.newobj();
        self.put("<<");
        self.put_info();
        self.put(">>");
        self.put("endobj");

        self.newobj();
        self.put("<<");
        self.put_catalog();
        self.put(">>");
        self.put("endobj");

        let xref = self.buffer.len();
        self.put("xref");
        self.put(&format!("0 {}", self.n + 1));
        self.put("0000000000 65535 f ");
        for j in 1..=self.n {
            let offset = self.offsets[j];
            self.put(&format!("{offset:010} 00000 n "));
        }

        self.put("trailer");
        self.put("<<");
        self.put_trailer();
        self.put(">>");
        self.put("startxref");
        self.put(&xref.to_string());
        self.put("%%EOF");
        self.state = DocState::Closed;
        debug!(objects = self.n, bytes = self.buffer.len(), "document finalized");
        Ok(())
    }

    fn put_pages(&mut self) -> Result<()> {
        let nb = self.page_count();
        if let Some(alias) = &self.alias_nb {
            let alias = alias.as_bytes().to_vec();
            let count = nb.to_string();
            for page in self.pages.iter_mut().skip(1) {
                *page = replace_bytes(page, &alias, count.as_bytes());
            }
        }
        let default_size = match self.def_orientation {
            Orientation::Portrait => self.def_page_size,
            Orientation::Landscape => self.def_page_size.swapped(),
        };
        let filter = if self.compress {
            "/Filter /FlateDecode "
        } else {
            ""
        };
        for page in 1..=nb {
            let n = self.newobj();
            self.put("<</Type /Page");
            self.put("/Parent 1 0 R");
            if let Some(size) = self.page_sizes.get(&page).copied() {
                self.put(&format!("/MediaBox [0 0 {:.2} {:.2}]", size.wd, size.ht));
            }
            let boxes: Vec<String> = self
                .page_boxes
                .get(&page)
                .into_iter()
                .flatten()
                .map(|(kind, b)| {
                    format!(
                        "/{} [{:.2} {:.2} {:.2} {:.2}]",
                        kind.as_str(),
                        b[0],
                        b[1],
                        b[2],
                        b[3]
                    )
                })
                .collect();
            for entry in boxes {
                self.put(&entry);
            }
            if let Some(rotation) = self.page_rotations.get(&page).copied()
                && rotation != 0
            {
                self.put(&format!("/Rotate {rotation}"));
            }
            self.put("/Resources 2 0 R");
            if self.version > super::PdfVersion::V1_3 {
                self.put("/Group <</Type /Group /S /Transparency /CS /DeviceRGB>>");
            }
            self.put(&format!("/Contents {} 0 R>>", n + 1));
            self.put("endobj");

            self.newobj();
            let content = if self.compress {
                flate::compress(&self.pages[page])?.to_vec()
            } else {
                self.pages[page].clone()
            };
            self.put(&format!("<<{filter}/Length {}>>", content.len()));
            self.put_stream(&content);
            self.put("endobj");
        }

        self.offsets[1] = self.buffer.len();
        self.put("1 0 obj");
        self.put("<</Type /Pages");
        let kids: String = (0..nb).map(|i| format!("{} 0 R ", 3 + 2 * i)).collect();
        self.put(&format!("/Kids [{kids}]"));
        self.put(&format!("/Count {nb}"));
        self.put(&format!(
            "/MediaBox [0 0 {:.2} {:.2}]",
            default_size.wd * self.k,
            default_size.ht * self.k
        ));
        self.put(">>");
        self.put("endobj");
        Ok(())
    }

    fn put_resources(&mut self) -> Result<()> {
        self.put_layers();
        self.put_blend_modes();
        self.put_spot_colors();
        self.put_fonts()?;
        self.put_images()?;
        self.put_templates()?;

        self.offsets[2] = self.buffer.len();
        self.put("2 0 obj");
        self.put("<<");
        self.put_resource_dict();
        self.put(">>");
        self.put("endobj");

        if self.protection.is_some() {
            let n = self.newobj();
            if let Some(protection) = self.protection.as_mut() {
                protection.object = n;
            }
            let Some(protection) = self.protection.clone() else {
                return Ok(());
            };
            self.put("<<");
            self.put("/Filter /Standard");
            self.put("/V 1");
            self.put("/R 2");
            let mut o = b"/O (".to_vec();
            o.extend_from_slice(&escape(protection.o_value()));
            o.push(b')');
            self.put_bytes(&o);
            let mut u = b"/U (".to_vec();
            u.extend_from_slice(&escape(protection.u_value()));
            u.push(b')');
            self.put_bytes(&u);
            self.put(&format!("/P {}", protection.p_value()));
            self.put(">>");
            self.put("endobj");
        }
        Ok(())
    }

    fn put_resource_dict(&mut self) {
        self.put("/ProcSet [/PDF /Text /ImageB /ImageC /ImageI]");
        self.put_font_resources();

        self.put("/XObject <<");
        let mut entries: Vec<String> = self
            .image_objects
            .iter()
            .map(|(id, n)| format!("/I{id} {n} 0 R"))
            .collect();
        entries.extend(self.templates.keys().filter_map(|id| {
            self.template_objects
                .get(id)
                .map(|n| format!("/TPL{id} {n} 0 R"))
        }));
        for entry in entries {
            self.put(&entry);
        }
        self.put(">>");

        self.put_layer_resources();

        if !self.blend_list.is_empty() {
            self.put("/ExtGState <<");
            let states: Vec<String> = self
                .blend_list
                .iter()
                .enumerate()
                .map(|(j, state)| format!("/GS{} {} 0 R", j + 1, state.object))
                .collect();
            for state in states {
                self.put(&state);
            }
            self.put(">>");
        }

        self.put_spot_color_resources();
    }

    fn put_info(&mut self) {
        let producer = self.producer.clone().into_bytes();
        let entries = [
            ("/Producer", producer),
            ("/Title", self.title.clone()),
            ("/Subject", self.subject.clone()),
            ("/Author", self.author.clone()),
            ("/Keywords", self.keywords.clone()),
            ("/Creator", self.creator.clone()),
        ];
        for (key, value) in entries {
            if !value.is_empty() {
                self.put_text_entry(key, &value);
            }
        }
        let created = self.creation_date.unwrap_or_else(OffsetDateTime::now_utc);
        let modified = self.mod_date.unwrap_or(created);
        self.put_text_entry("/CreationDate", pdf_date(created).as_bytes());
        self.put_text_entry("/ModDate", pdf_date(modified).as_bytes());
    }

    fn put_catalog(&mut self) {
        self.put("/Type /Catalog");
        self.put("/Pages 1 0 R");
        match self.zoom_mode {
            ZoomMode::FullPage => self.put("/OpenAction [3 0 R /Fit]"),
            ZoomMode::FullWidth => self.put("/OpenAction [3 0 R /FitH null]"),
            ZoomMode::Real => self.put("/OpenAction [3 0 R /XYZ null null 1]"),
            ZoomMode::Percent(zoom) => {
                self.put(&format!("/OpenAction [3 0 R /XYZ null null {:.2}]", zoom / 100.0))
            }
            ZoomMode::Default => {}
        }
        let layout = match self.layout_mode {
            LayoutMode::Single => Some("SinglePage"),
            LayoutMode::Continuous => Some("OneColumn"),
            LayoutMode::TwoColumnLeft => Some("TwoColumnLeft"),
            LayoutMode::TwoColumnRight => Some("TwoColumnRight"),
            LayoutMode::TwoPageLeft => Some("TwoPageLeft"),
            LayoutMode::TwoPageRight => Some("TwoPageRight"),
            LayoutMode::Default => None,
        };
        if let Some(layout) = layout {
            self.put(&format!("/PageLayout /{layout}"));
        }
        self.put_layer_catalog();
    }

    fn put_trailer(&mut self) {
        self.put(&format!("/Size {}", self.n + 1));
        self.put(&format!("/Root {} 0 R", self.n));
        self.put(&format!("/Info {} 0 R", self.n - 1));
        if let Some(protection) = &self.protection {
            let line = format!("/Encrypt {} 0 R", protection.object);
            self.put(&line);
            self.put("/ID [()()]");
        }
    }
}
