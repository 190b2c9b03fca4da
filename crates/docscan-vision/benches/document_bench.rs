// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-frame detection pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};

use docscan_core::{ChannelLayout, ImageView, Point, Quadrilateral, ScannerConfig};
use docscan_vision::FrameAnalyzer;

/// A synthetic 400x400 grayscale frame with a lighter quadrilateral (the
/// "document") on a darker background, close enough to a real frame's
/// contrast profile to exercise the full Canny/contour/Hough fallback chain
/// rather than the zero-candidate early exit.
fn synthetic_frame() -> ImageView {
    let (width, height) = (400u32, 400u32);
    let mut img = GrayImage::from_pixel(width, height, Luma([40u8]));
    for y in 60..340 {
        for x in 60..340 {
            img.put_pixel(x, y, Luma([230u8]));
        }
    }
    ImageView::packed(width, height, ChannelLayout::Luma, img.into_raw()).unwrap()
}

fn bench_analyze(c: &mut Criterion) {
    let frame = synthetic_frame();
    let config = ScannerConfig::default();
    let analyzer = FrameAnalyzer::new();

    c.bench_function("analyze (400x400 synthetic document)", |b| {
        b.iter(|| {
            let result = analyzer.analyze(black_box(&frame), black_box(&config), 0);
            black_box(result).unwrap();
        });
    });
}

fn bench_rectify(c: &mut Criterion) {
    let frame = synthetic_frame();
    let analyzer = FrameAnalyzer::new();
    let quad = Quadrilateral::new(
        Point::new(60.0, 60.0),
        Point::new(340.0, 60.0),
        Point::new(340.0, 340.0),
        Point::new(60.0, 340.0),
    );

    c.bench_function("rectify (400x400 -> 280x280)", |b| {
        b.iter(|| {
            let result = analyzer.rectify(black_box(&frame), black_box(&quad));
            black_box(result).unwrap();
        });
    });
}

criterion_group!(benches, bench_analyze, bench_rectify);
criterion_main!(benches);
