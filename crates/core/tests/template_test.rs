//! Template recording, replay and serialization.

use vellum_core::{Document, DocumentOptions, ImageOptions, PdfError, Point, Size, Template, Unit};

fn doc() -> Document {
    let mut doc = Document::with_options(DocumentOptions {
        unit: Unit::Point,
        compression: false,
        ..DocumentOptions::default()
    });
    doc.add_page();
    doc
}

fn square(doc: &mut Document) -> Template {
    doc.create_template_custom(Point::new(0.0, 0.0), Size::new(50.0, 50.0), |t| {
        t.rect(5.0, 5.0, 40.0, 40.0, "D");
    })
}

/// A 3x2 grayscale JPEG: SOI, a baseline frame header and EOI.
const TINY_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x02, 0x00, 0x03, 0x01, 0x01, 0x11, 0x00, 0xFF,
    0xD9,
];

/// Object number of template `id` from its `/TPL{id} n 0 R` reference.
fn object_number(pdf: &str, id: &str) -> usize {
    let key = format!("/TPL{id} ");
    pdf.match_indices(&key)
        .filter_map(|(pos, _)| {
            let rest = &pdf[pos + key.len()..];
            let n = rest.split(' ').next()?;
            rest[n.len()..].starts_with(" 0 R").then(|| n.parse().ok())?
        })
        .next()
        .unwrap()
}

#[test]
fn test_identical_templates_share_id() {
    let mut doc = doc();
    let a = square(&mut doc);
    let b = square(&mut doc);
    assert_eq!(a.id(), b.id());
    assert_eq!(a.num_pages(), 1);
    assert_eq!(a.id().len(), 40);
}

#[test]
fn test_template_written_once() {
    let mut doc = doc();
    let a = square(&mut doc);
    let b = square(&mut doc);
    doc.use_template(&a);
    doc.use_template_scaled(&b, Point::new(100.0, 100.0), Size::new(100.0, 100.0));
    let pdf = doc.output_bytes().unwrap();
    let text = String::from_utf8_lossy(&pdf);
    assert_eq!(text.matches("/Subtype /Form").count(), 1);
    assert_eq!(text.matches(&format!("/TPL{} Do Q", a.id())).count(), 2);
    assert!(text.contains("q 2.0000 0 0 2.0000 100.0000 641.8900 cm"));
}

#[test]
fn test_nested_template_precedes_user() {
    let mut doc = doc();
    let inner = square(&mut doc);
    let outer = doc.create_template(|t| {
        t.use_template(&inner);
        t.line(0.0, 0.0, 10.0, 10.0);
    });
    assert_eq!(outer.templates().len(), 1);
    doc.use_template(&outer);
    let pdf = doc.output_bytes().unwrap();
    let text = String::from_utf8_lossy(&pdf);
    let inner_obj = object_number(&text, &inner.id());
    let outer_obj = object_number(&text, &outer.id());
    assert!(inner_obj < outer_obj);
}

#[test]
fn test_serialize_round_trip() {
    let mut doc = doc();
    let inner = square(&mut doc);
    let outer = doc.create_template(|t| {
        t.use_template(&inner);
        t.register_image_options_reader("logo.jpg", &ImageOptions::default(), TINY_JPEG);
        t.image("logo.jpg", 5.0, 5.0, 30.0, 20.0, false);
        t.add_page();
        t.circle(20.0, 20.0, 10.0, "F");
    });
    assert_eq!(outer.images().len(), 1);
    let data = outer.serialize().unwrap();
    let back = Template::deserialize(&data).unwrap();
    assert_eq!(back.bytes(), outer.bytes());
    assert_eq!(back.num_pages(), 2);
    assert_eq!(back.images(), outer.images());
    assert_eq!(back.size(), outer.size());
    let ids: Vec<String> = back.templates().iter().map(Template::id).collect();
    assert!(ids.contains(&inner.id()));
}

#[test]
fn test_corrupt_data_is_rejected() {
    assert!(matches!(
        Template::deserialize(b"{not json"),
        Err(PdfError::Template(_))
    ));
}

#[test]
fn test_page_views() {
    let mut doc = doc();
    let t = doc.create_template(|t| {
        t.rect(1.0, 1.0, 2.0, 2.0, "D");
        t.add_page();
        t.rect(3.0, 3.0, 4.0, 4.0, "F");
    });
    let pages = t.from_pages();
    assert_eq!(pages.len(), 2);
    assert_ne!(pages[0].id(), pages[1].id());
    assert!(t.from_page(0).is_err());
    assert!(t.from_page(3).is_err());
}

#[test]
fn test_use_before_page_latches() {
    let mut doc = Document::with_options(DocumentOptions::default());
    let t = doc.create_template(|t| t.line(0.0, 0.0, 1.0, 1.0));
    doc.use_template(&t);
    assert!(matches!(doc.error(), Some(PdfError::Template(_))));
}

#[test]
fn test_error_in_build_reaches_parent() {
    let mut doc = doc();
    let _ = doc.create_template(|t| t.text(1.0, 1.0, "no font"));
    assert!(matches!(doc.error(), Some(PdfError::FontNotSet)));
}

#[test]
fn test_zero_size_template_latches() {
    let mut doc = doc();
    let empty = doc.create_template_custom(Point::new(0.0, 0.0), Size::new(0.0, 0.0), |t| {
        t.line(0.0, 0.0, 1.0, 1.0);
    });
    doc.use_template(&empty);
    assert!(matches!(doc.error(), Some(PdfError::Template(_))));
    assert!(doc.output_bytes().is_err());
}
