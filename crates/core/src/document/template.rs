//! Templates: recorded page content replayed as Form XObjects.
//!
//! A template is built by running a closure against a scratch document that
//! inherits the caller's graphics state. Its identity is the SHA-1 of the
//! recorded content, so identical templates collapse into one XObject.
//! Templates may use other templates; nested ones are written first.

use std::collections::HashSet;
use std::mem;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Document, DocumentOptions, Orientation, PageSize};
use crate::codec::flate;
use crate::error::{PdfError, Result};
use crate::image::ImageInfo;
use crate::utils::{Point, Size, sha1_hex};

/// A reusable block of content. Cheap to clone: page buffers are shared
/// between a template and its per-page views.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    corner: Point,
    size: Size,
    /// Content per page; index 0 is unused.
    pages: Arc<Vec<Vec<u8>>>,
    images: IndexMap<String, Arc<ImageInfo>>,
    templates: Vec<Template>,
    page: usize,
}

/// Wire form of a template. Only templates and images that are not already
/// carried by a nested template are stored at each level.
#[derive(Serialize, Deserialize)]
struct TemplateRecord {
    templates: Vec<TemplateRecord>,
    images: IndexMap<String, ImageInfo>,
    corner: Point,
    size: Size,
    pages: Vec<Vec<u8>>,
    page: usize,
}

impl Template {
    /// SHA-1 hex digest of the current page's content.
    pub fn id(&self) -> String {
        sha1_hex(self.bytes())
    }

    /// Lower left corner and size of the bounding box, in user units.
    pub fn size(&self) -> (Point, Size) {
        (self.corner, self.size)
    }

    /// Content stream of the current page.
    pub fn bytes(&self) -> &[u8] {
        self.pages.get(self.page).map_or(&[], Vec::as_slice)
    }

    /// A view of page `page` (1-based) of this template.
    pub fn from_page(&self, page: usize) -> Result<Template> {
        if page == 0 {
            return Err(PdfError::Template("pages start at 1, no template has a page 0".into()));
        }
        if page > self.num_pages() {
            return Err(PdfError::Template(format!("the template does not have a page {page}")));
        }
        Ok(Template {
            page,
            ..self.clone()
        })
    }

    /// One view per page.
    pub fn from_pages(&self) -> Vec<Template> {
        (1..=self.num_pages())
            .filter_map(|page| self.from_page(page).ok())
            .collect()
    }

    /// Images used by the template, including those of nested templates.
    pub fn images(&self) -> &IndexMap<String, Arc<ImageInfo>> {
        &self.images
    }

    /// Templates used by this one, nested ones before their users.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    fn children_images(&self) -> IndexMap<String, Arc<ImageInfo>> {
        let mut images = IndexMap::new();
        for child in &self.templates {
            let id = child.id();
            for (name, info) in &child.images {
                images.insert(format!("t{id}-{name}"), info.clone());
            }
        }
        images
    }

    fn children_templates(&self) -> Vec<Template> {
        self.templates
            .iter()
            .flat_map(|child| child.templates.iter().cloned())
            .collect()
    }

    fn to_record(&self) -> TemplateRecord {
        let nested: HashSet<String> = self.children_templates().iter().map(Template::id).collect();
        let templates = self
            .templates
            .iter()
            .filter(|t| !nested.contains(&t.id()))
            .map(Template::to_record)
            .collect();
        let child_images = self.children_images();
        let images = self
            .images
            .iter()
            .filter(|(name, _)| !child_images.contains_key(*name))
            .map(|(name, info)| (name.clone(), info.as_ref().clone()))
            .collect();
        TemplateRecord {
            templates,
            images,
            corner: self.corner,
            size: self.size,
            pages: self.pages.as_ref().clone(),
            page: self.page,
        }
    }

    fn from_record(record: TemplateRecord) -> Result<Template> {
        let first_class = record
            .templates
            .into_iter()
            .map(Template::from_record)
            .collect::<Result<Vec<_>>>()?;
        if record.pages.is_empty() || record.page >= record.pages.len() {
            return Err(PdfError::Template(format!(
                "page {} out of range in serialized template",
                record.page
            )));
        }
        let mut template = Template {
            corner: record.corner,
            size: record.size,
            pages: Arc::new(record.pages),
            images: IndexMap::new(),
            templates: first_class,
            page: record.page,
        };
        let child_images = template.children_images();
        let mut templates = template.children_templates();
        templates.append(&mut template.templates);
        template.templates = templates;
        template.images = record
            .images
            .into_iter()
            .map(|(name, info)| (name, Arc::new(info)))
            .collect();
        template.images.extend(child_images);
        Ok(template)
    }

    /// Encode the template and everything it uses.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.to_record())
            .map_err(|e| PdfError::Template(format!("cannot encode template: {e}")))
    }

    /// Decode a template produced by [`Template::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Template> {
        let record: TemplateRecord = serde_json::from_slice(data)
            .map_err(|e| PdfError::Template(format!("cannot decode template: {e}")))?;
        Template::from_record(record)
    }
}

/// `templates` and everything they use, each once, nested templates before
/// the templates that use them.
fn dependency_order<'a>(templates: impl IntoIterator<Item = &'a Template>) -> Vec<Template> {
    fn visit(t: &Template, seen: &mut HashSet<String>, out: &mut Vec<Template>) {
        if !seen.insert(t.id()) {
            return;
        }
        for child in &t.templates {
            visit(child, seen, out);
        }
        out.push(t.clone());
    }
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for t in templates {
        visit(t, &mut seen, &mut out);
    }
    out
}

impl Document {
    /// Record a template the size of the current page.
    pub fn create_template(&mut self, build: impl FnOnce(&mut Document)) -> Template {
        let size = Size::new(self.w, self.h);
        self.create_template_custom(Point::default(), size, build)
    }

    /// Record a template with the given bounding box. `build` draws into a
    /// scratch document that starts with this document's position, line
    /// style, colors and font; fonts it loads become available here, and an
    /// error it latches is latched here too.
    pub fn create_template_custom(
        &mut self,
        corner: Point,
        size: Size,
        build: impl FnOnce(&mut Document),
    ) -> Template {
        let mut sub = Document::with_options(DocumentOptions {
            orientation: Orientation::Portrait,
            unit: self.unit,
            size: PageSize::Custom(size),
            font_dir: self.font_dir.clone(),
            compression: false,
            ..DocumentOptions::default()
        });
        sub.font_loader = self.font_loader.clone();
        sub.x = self.x;
        sub.y = self.y;
        sub.line_width = self.line_width;
        sub.cap_style = self.cap_style;
        sub.join_style = self.join_style;
        sub.draw_color = self.draw_color.clone();
        sub.fill_color = self.fill_color.clone();
        sub.text_color = self.text_color.clone();
        sub.color_flag = self.color_flag;
        sub.fonts = mem::take(&mut self.fonts);
        sub.current_font = self.current_font.clone();
        sub.font_family = self.font_family.clone();
        sub.font_style = self.font_style.clone();
        sub.underline = self.underline;
        sub.strikeout = self.strikeout;
        sub.font_size = self.font_size;
        sub.font_size_pt = self.font_size_pt;
        sub.ws = self.ws;
        sub.images = self.images.clone();
        sub.spot_colors = self.spot_colors.clone();

        sub.add_page();
        build(&mut sub);
        if sub.state == super::DocState::PageOpen {
            sub.end_layer();
        }

        self.fonts = mem::take(&mut sub.fonts);
        if let Some(err) = sub.err.take() {
            self.set_error(err);
        }
        let template = Template {
            corner,
            size,
            pages: Arc::new(mem::take(&mut sub.pages)),
            images: mem::take(&mut sub.images),
            templates: dependency_order(sub.templates.values()),
            page: sub.page,
        };
        trace!(id = %template.id(), pages = template.num_pages(), "template created");
        template
    }

    /// Draw `template` at its own position and size.
    pub fn use_template(&mut self, template: &Template) {
        let (corner, size) = template.size();
        self.use_template_scaled(template, corner, size);
    }

    /// Draw `template` with its bounding box mapped to `size` at `corner`.
    pub fn use_template_scaled(&mut self, template: &Template, corner: Point, size: Size) {
        if self.err.is_some() {
            return;
        }
        if self.page == 0 {
            self.set_error(PdfError::Template(
                "cannot use a template without first adding a page".into(),
            ));
            return;
        }
        let (_, template_size) = template.size();
        if template_size.wd <= 0.0 || template_size.ht <= 0.0 {
            self.set_error(PdfError::Template(format!(
                "template size must be positive, got {}x{}",
                template_size.wd, template_size.ht
            )));
            return;
        }
        let id = template.id();
        self.templates.insert(id.clone(), template.clone());
        for child in template.templates() {
            self.templates.insert(child.id(), child.clone());
        }
        for (name, info) in template.images() {
            self.images.insert(format!("t{id}-{name}"), info.clone());
        }
        let scale_x = size.wd / template_size.wd;
        let scale_y = size.ht / template_size.ht;
        let tx = corner.x * self.k;
        let ty = (self.h - corner.y - size.ht) * self.k;
        self.out(&format!("q {scale_x:.4} 0 0 {scale_y:.4} {tx:.4} {ty:.4} cm"));
        self.out(&format!("/TPL{id} Do Q"));
    }

    pub(crate) fn put_templates(&mut self) -> Result<()> {
        let filter = if self.compress {
            "/Filter /FlateDecode "
        } else {
            ""
        };
        let k = self.k;
        for t in dependency_order(self.templates.values()) {
            let id = t.id();
            if self.template_objects.contains_key(&id) {
                continue;
            }
            let (corner, size) = t.size();
            let n = self.newobj();
            self.template_objects.insert(id, n);
            self.put(&format!("<<{filter}/Type /XObject"));
            self.put("/Subtype /Form");
            self.put("/FormType 1");
            self.put(&format!(
                "/BBox [{:.2} {:.2} {:.2} {:.2}]",
                corner.x * k,
                corner.y * k,
                (corner.x + size.wd) * k,
                (corner.y + size.ht) * k
            ));
            if corner.x != 0.0 || corner.y != 0.0 {
                self.put(&format!(
                    "/Matrix [1 0 0 1 {:.5} {:.5}]",
                    -corner.x * k,
                    -corner.y * k
                ));
            }
            self.put("/Resources ");
            self.put("<</ProcSet [/PDF /Text /ImageB /ImageC /ImageI]");
            self.put_font_resources();
            if !t.images().is_empty() || !t.templates().is_empty() {
                self.put("/XObject <<");
                let mut entries = Vec::new();
                let mut seen = HashSet::new();
                for info in t.images().values() {
                    if let Some(obj) = self.image_objects.get(&info.id)
                        && seen.insert(info.id.clone())
                    {
                        entries.push(format!("/I{} {obj} 0 R", info.id));
                    }
                }
                for child in t.templates() {
                    let child_id = child.id();
                    if let Some(obj) = self.template_objects.get(&child_id) {
                        entries.push(format!("/TPL{child_id} {obj} 0 R"));
                    }
                }
                for entry in entries {
                    self.put(&entry);
                }
                self.put(">>");
            }
            self.put(">>");

            let content = if self.compress {
                flate::compress(t.bytes())?.to_vec()
            } else {
                t.bytes().to_vec()
            };
            self.put(&format!("/Length {} >>", content.len()));
            self.put_stream(&content);
            self.put("endobj");
        }
        Ok(())
    }

    /// The `/Font` resource entries for every font in use.
    pub(crate) fn put_font_resources(&mut self) {
        self.put("/Font <<");
        let entries: Vec<String> = self
            .fonts
            .fonts()
            .filter_map(|(key, font)| {
                self.font_objects
                    .get(key)
                    .map(|n| format!("/F{} {n} 0 R", font.id))
            })
            .collect();
        for entry in entries {
            self.put(&entry);
        }
        self.put(">>");
    }
}

#[cfg(test)]
mod tests {
    use super::super::Unit;
    use super::*;

    fn doc() -> Document {
        let mut doc = Document::with_options(DocumentOptions {
            unit: Unit::Point,
            compression: false,
            ..DocumentOptions::default()
        });
        doc.add_page();
        doc
    }

    #[test]
    fn identical_content_has_identical_id() {
        let mut doc = doc();
        let a = doc.create_template(|d| d.rect(10.0, 10.0, 20.0, 20.0, "D"));
        let b = doc.create_template(|d| d.rect(10.0, 10.0, 20.0, 20.0, "D"));
        let c = doc.create_template(|d| d.rect(10.0, 10.0, 30.0, 20.0, "D"));
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.num_pages(), 1);
    }

    #[test]
    fn from_page_bounds() {
        let mut doc = doc();
        let t = doc.create_template(|d| {
            d.add_page();
            d.line(0.0, 0.0, 1.0, 1.0);
        });
        assert_eq!(t.num_pages(), 2);
        assert_eq!(t.from_pages().len(), 2);
        assert!(t.from_page(0).is_err());
        assert!(t.from_page(3).is_err());
        let first = t.from_page(1).unwrap();
        assert_ne!(first.bytes(), t.bytes());
    }

    #[test]
    fn use_template_requires_page() {
        let mut parent = Document::with_options(DocumentOptions::default());
        let t = parent.create_template(|_| {});
        parent.use_template(&t);
        assert!(matches!(parent.error(), Some(PdfError::Template(_))));
    }

    #[test]
    fn use_template_emits_transform() {
        let mut doc = doc();
        let t = doc.create_template_custom(Point::default(), Size::new(100.0, 50.0), |d| {
            d.line(0.0, 0.0, 10.0, 10.0);
        });
        doc.pages[1].clear();
        doc.use_template_scaled(&t, Point::new(10.0, 20.0), Size::new(200.0, 50.0));
        let content = String::from_utf8(doc.pages[1].clone()).unwrap();
        let ty = 841.89 - 20.0 - 50.0;
        assert_eq!(
            content,
            format!("q 2.0000 0 0 1.0000 10.0000 {ty:.4} cm\n/TPL{} Do Q\n", t.id())
        );
    }

    #[test]
    fn nested_templates_are_ordered_before_users() {
        let mut doc = doc();
        let inner = doc.create_template(|d| d.line(0.0, 0.0, 5.0, 5.0));
        let outer = doc.create_template(|d| d.use_template(&inner));
        assert_eq!(outer.templates().len(), 1);
        let order = dependency_order([&outer]);
        assert_eq!(order[0].id(), inner.id());
        assert_eq!(order[1].id(), outer.id());
    }

    #[test]
    fn fonts_loaded_in_template_reach_parent() {
        let mut doc = doc();
        doc.create_template(|d| d.set_font("courier", "", 10.0));
        assert!(doc.fonts.contains("courier"));
    }

    #[test]
    fn error_in_template_latches_parent() {
        let mut doc = doc();
        doc.create_template(|d| d.set_font("nonesuch", "", 10.0));
        assert!(matches!(doc.error(), Some(PdfError::UndefinedFont { .. })));
    }
}
