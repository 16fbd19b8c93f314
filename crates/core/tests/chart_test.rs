//! Tick mark selection and grid mapping.

use vellum_core::chart::{Grid, nice_num, tickmark_precision, tickmarks};
use vellum_core::{Document, DocumentOptions, Unit};

#[test]
fn test_tickmarks_enclose_range() {
    for &(min, max) in &[(0.0, 1.0), (-3.2, 7.9), (12.0, 1013.0), (0.001, 0.0042)] {
        let (ticks, _) = tickmarks(min, max);
        assert!(ticks.len() >= 2, "{min}..{max}");
        assert!(ticks[0] <= min);
        assert!(*ticks.last().unwrap() >= max - 1e-12);
        let step = ticks[1] - ticks[0];
        for pair in ticks.windows(2) {
            assert!((pair[1] - pair[0] - step).abs() < step * 1e-9);
        }
    }
}

#[test]
fn test_tickmarks_known_case() {
    let (ticks, precision) = tickmarks(0.0, 10.0);
    assert_eq!(ticks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    assert_eq!(precision, 0);
    let (_, precision) = tickmarks(0.0, 1.0);
    assert_eq!(precision, 1);
}

#[test]
fn test_nice_num_round_is_stable() {
    let mut x = 1e-9;
    while x < 1e12 {
        let once = nice_num(x, true);
        assert_eq!(nice_num(once, true), once, "{x} -> {once}");
        x *= 1.37;
    }
    assert_eq!(nice_num(9.2235e-6, true), 1e-5);
}

#[test]
fn test_nice_num_is_nice() {
    for v in [0.013, 0.7, 3.3, 48.0, 999.0, 12345.0] {
        for round in [false, true] {
            let n = nice_num(v, round);
            let mantissa = n / 10f64.powf(n.log10().floor());
            assert!(
                [1.0, 2.0, 5.0, 10.0].iter().any(|m| (m - mantissa).abs() < 1e-9),
                "{v} -> {n}"
            );
            if !round {
                assert!(n >= v);
            }
        }
    }
    assert_eq!(tickmark_precision(0.001), 3);
}

#[test]
fn test_grid_contain() {
    let mut grid = Grid::new(20.0, 20.0, 160.0, 100.0);
    grid.tickmarks_contain_x(1.3, 8.6);
    grid.tickmarks_contain_y(-40.0, 55.0);
    let (x0, x1) = grid.x_range();
    let (y0, y1) = grid.y_range();
    assert_eq!(grid.x(x0), 20.0);
    assert_eq!(grid.x(x1), 180.0);
    assert!((grid.y(y0) - 120.0).abs() < 1e-9);
    assert!((grid.y(y1) - 20.0).abs() < 1e-9);
    assert!(grid.ht(1.0) < 0.0);
    assert_eq!(grid.ht_abs(1.0), -grid.ht(1.0));
    assert_eq!(grid.wd_abs(-2.0), grid.wd(2.0));
}

#[test]
fn test_grid_draws_and_restores_state() {
    let mut doc = Document::with_options(DocumentOptions {
        unit: Unit::Millimeter,
        compression: false,
        ..DocumentOptions::default()
    });
    doc.add_page();
    doc.set_font("Helvetica", "", 12.0);
    doc.set_draw_color(1, 2, 3);
    doc.set_line_width(0.5);
    let mut grid = Grid::new(20.0, 20.0, 160.0, 100.0);
    grid.tickmarks_extent_x(0.0, 1.0, 4);
    grid.tickmarks_extent_y(0.0, 10.0, 5);
    grid.grid(&mut doc);
    grid.plot(&mut doc, 0.0, 4.0, 20, |x| x * x);
    assert!(doc.ok());
    assert_eq!(doc.get_draw_color(), (1, 2, 3));
    assert_eq!(doc.get_line_width(), 0.5);
    assert_eq!(doc.get_font_size().0, 12.0);
    let pdf = doc.output_bytes().unwrap();
    let text = String::from_utf8_lossy(&pdf);
    assert!(text.contains("(0)Tj"));
    assert!(text.contains("(50)Tj"));
}
