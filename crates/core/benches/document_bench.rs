use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use vellum_core::flate;
use vellum_core::{DocumentBuilder, NextPosition, Unit};

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. ";

fn bench_split_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_lines");
    for &paragraphs in &[1usize, 10, 100] {
        let text = LOREM.repeat(paragraphs);
        let mut doc = DocumentBuilder::new().unit(Unit::Millimeter).build();
        doc.add_page();
        doc.set_font("Helvetica", "", 10.0);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &text, |b, text| {
            b.iter(|| {
                let lines = doc.split_lines(text.as_bytes(), 60.0);
                black_box(lines.len());
            })
        });
    }
    group.finish();
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("flate_compress");
    for &kib in &[4usize, 64, 512] {
        let data: Vec<u8> = LOREM.bytes().cycle().take(kib * 1024).collect();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(kib), &data, |b, data| {
            b.iter(|| {
                let packed = flate::compress(data).map(|buf| buf.len());
                black_box(packed.ok());
            })
        });
    }
    group.finish();
}

fn bench_full_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_document");
    for &pages in &[1usize, 20] {
        group.throughput(Throughput::Elements(pages as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pages), &pages, |b, &pages| {
            b.iter(|| {
                let mut doc = DocumentBuilder::new().build();
                doc.set_font("Times", "", 11.0);
                for page in 0..pages {
                    doc.add_page();
                    let title = format!("Page {}", page + 1);
                    doc.cell_format(0.0, 8.0, &title, "B", NextPosition::NextLine, "C", false);
                    doc.multi_cell(0.0, 5.0, &LOREM.repeat(8), "", "J", false);
                    doc.rect(20.0, 200.0, 170.0, 60.0, "D");
                }
                let pdf = doc.output_bytes().map(|pdf| pdf.len());
                black_box(pdf.ok());
            })
        });
    }
    group.finish();
}

criterion_group!(
    document_benches,
    bench_split_lines,
    bench_compress,
    bench_full_document
);
criterion_main!(document_benches);
