//! Whole-document output: structure, pages, hooks and metadata.

use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use vellum_core::flate;
use vellum_core::{
    Document, DocumentBuilder, LayoutMode, Orientation, PageBoxKind, PageSize, PdfError, Size,
    Unit, ZoomMode,
};

fn fixed_date() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_709_622_489).unwrap()
}

fn plain() -> Document {
    DocumentBuilder::new()
        .unit(Unit::Point)
        .compression(false)
        .creation_date(fixed_date())
        .build()
}

fn text(pdf: &[u8]) -> String {
    String::from_utf8_lossy(pdf).into_owned()
}

#[test]
fn test_xref_offsets_point_at_objects() {
    let mut doc = plain();
    doc.add_page();
    doc.set_font("Times", "B", 14.0);
    doc.cell(0.0, 20.0, "Hello, world");
    let pdf = doc.output_bytes().unwrap();
    let body = text(&pdf);
    let xref = body.rfind("\nxref\n").unwrap() + 1;
    let startxref: usize = body
        .rsplit("startxref\n")
        .next()
        .and_then(|rest| rest.lines().next())
        .and_then(|n| n.parse().ok())
        .unwrap();
    assert_eq!(startxref, xref);
    let entries: Vec<&str> = body[xref..]
        .lines()
        .skip(3)
        .take_while(|l| l.ends_with(" n "))
        .collect();
    assert!(!entries.is_empty());
    for (i, entry) in entries.iter().enumerate() {
        let offset: usize = entry[..10].parse().unwrap();
        assert!(body[offset..].starts_with(&format!("{} 0 obj", i + 1)));
    }
}

#[test]
fn test_output_is_deterministic() {
    let build = || {
        let mut doc = plain();
        doc.add_page();
        doc.set_font("Courier", "", 10.0);
        doc.multi_cell(200.0, 12.0, "The quick brown fox jumps over the lazy dog", "1", "J", false);
        doc.output_bytes().unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn test_compressed_page_content() {
    let mut doc = DocumentBuilder::new()
        .unit(Unit::Point)
        .creation_date(fixed_date())
        .build();
    doc.add_page();
    doc.line(10.0, 10.0, 100.0, 100.0);
    let pdf = doc.output_bytes().unwrap();
    let body = text(&pdf);
    assert!(body.contains("/Filter /FlateDecode /Length "));
    let start = pdf.windows(7).position(|w| w == b"stream\n").unwrap() + 7;
    let end = start + pdf[start..].windows(10).position(|w| w == b"\nendstream").unwrap();
    let content = flate::uncompress(&pdf[start..end]).unwrap().to_vec();
    assert!(text(&content).contains("10.00 831.89 m 100.00 741.89 l S"));
}

#[test]
fn test_header_footer_and_alias() {
    let footers = Arc::new(Mutex::new(0));
    let counter = footers.clone();
    let mut doc = plain();
    doc.alias_nb_pages("");
    doc.set_header_fn(
        Box::new(|d: &mut Document| {
            d.set_font("Helvetica", "", 9.0);
            d.cell(0.0, 10.0, "header");
        }),
        true,
    );
    doc.set_footer_fn(Box::new(move |d: &mut Document| {
        *counter.lock().unwrap() += 1;
        d.set_y(-30.0);
        let label = format!("Page {} of {{nb}}", d.page_no());
        d.cell(0.0, 10.0, &label);
    }));
    doc.add_page();
    doc.add_page();
    doc.add_page();
    let pdf = doc.output_bytes().unwrap();
    let body = text(&pdf);
    assert_eq!(*footers.lock().unwrap(), 3);
    assert!(body.contains("(Page 3 of 3)Tj"));
    assert!(!body.contains("{nb}"));
    assert_eq!(body.matches("(header)Tj").count(), 3);
    assert!(body.contains("/Count 3"));
}

#[test]
fn test_auto_page_break() {
    let mut doc = plain();
    doc.add_page();
    doc.set_font("Helvetica", "", 12.0);
    for _ in 0..100 {
        doc.cell_format(0.0, 20.0, "row", "", Default::default(), "L", false);
        doc.ln(-1.0);
    }
    assert!(doc.page_count() > 1);
    assert!(doc.ok());
}

#[test]
fn test_page_formats_and_boxes() {
    let mut doc = plain();
    doc.set_page_box(PageBoxKind::CropBox, 10.0, 10.0, 100.0, 100.0);
    doc.add_page();
    doc.add_page_format(Orientation::Landscape, Size::new(200.0, 300.0));
    doc.set_page_rotation(90);
    doc.set_page_box(PageBoxKind::TrimBox, 0.0, 0.0, 50.0, 60.0);
    assert_eq!(doc.get_page_size(), (300.0, 200.0));
    let pdf = doc.output_bytes().unwrap();
    let body = text(&pdf);
    assert!(body.contains("/CropBox [10.00 10.00 110.00 110.00]"));
    assert!(body.contains("/MediaBox [0 0 300.00 200.00]"));
    assert!(body.contains("/TrimBox [0.00 0.00 50.00 60.00]"));
    assert!(body.contains("/Rotate 90"));
}

#[test]
fn test_bad_rotation_latches() {
    let mut doc = plain();
    doc.add_page();
    doc.set_page_rotation(45);
    assert!(matches!(doc.error(), Some(PdfError::InvalidArgument(_))));
}

#[test]
fn test_information_dictionary() {
    let mut doc = plain();
    doc.set_title("Report", false);
    doc.set_author("José", true);
    doc.set_producer("vellum");
    doc.set_display_mode(ZoomMode::FullPage, LayoutMode::Continuous);
    doc.add_page();
    let pdf = doc.output_bytes().unwrap();
    let body = text(&pdf);
    assert!(body.contains("/Title (Report)"));
    assert!(body.contains("/Producer (vellum)"));
    assert!(body.contains("/CreationDate (D:20240305070809)"));
    assert!(body.contains("/ModDate (D:20240305070809)"));
    assert!(body.contains("/OpenAction [3 0 R /Fit]"));
    assert!(body.contains("/PageLayout /OneColumn"));
    let bom = pdf.windows(11).any(|w| w == b"/Author (\xfe\xff");
    assert!(bom);
}

#[test]
fn test_transparency_raises_version() {
    let mut doc = plain();
    doc.add_page();
    doc.set_alpha(0.5, Default::default());
    doc.rect(10.0, 10.0, 10.0, 10.0, "F");
    let pdf = doc.output_bytes().unwrap();
    let body = text(&pdf);
    assert!(body.starts_with("%PDF-1.4"));
    assert!(body.contains("/ExtGState <<"));
    assert!(body.contains("/GS1 gs"));
    assert!(body.contains("/Group <</Type /Group /S /Transparency /CS /DeviceRGB>>"));
}

#[test]
fn test_output_file() {
    let path = std::env::temp_dir().join(format!("vellum-{}.pdf", std::process::id()));
    let mut doc = Document::new(Orientation::Portrait, Unit::Millimeter, PageSize::A5, "");
    doc.add_page();
    doc.output_file(&path).unwrap();
    let written = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(written.starts_with(b"%PDF-1.3"));
}

#[test]
fn test_add_page_after_close() {
    let mut doc = plain();
    doc.close();
    doc.add_page();
    assert!(matches!(doc.error(), Some(PdfError::Closed)));
}
