use criterion::{criterion_group, criterion_main, Criterion};
use screenmatch::{ImageView, MatchConfig, Matcher, Method, OwnedImage, ScaleSchedule, Template};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn bench_matcher(c: &mut Criterion) {
    let (tpl_width, tpl_height) = (48, 32);
    let tpl = make_image(tpl_width, tpl_height);
    let tpl_view = ImageView::from_slice(&tpl, tpl_width, tpl_height).unwrap();
    let plan = Template::new(tpl.clone(), tpl_width, tpl_height)
        .unwrap()
        .plan()
        .unwrap();

    let mut screen = OwnedImage::filled(480, 320, 0).unwrap();
    for (x, y) in [(40, 40), (200, 120), (360, 240)] {
        screen.paste(tpl_view, x, y);
    }

    let pyramid = Matcher::scalar();
    c.bench_function("ccoeff_full_pyramid", |b| {
        b.iter(|| black_box(pyramid.find_all(&screen, &plan).unwrap()));
    });

    let native = Matcher::scalar().with_config(MatchConfig {
        schedule: ScaleSchedule::native_only(),
        ..MatchConfig::default()
    });
    c.bench_function("ccoeff_native_only", |b| {
        b.iter(|| black_box(native.find_all(&screen, &plan).unwrap()));
    });

    let sqdiff = Matcher::scalar().with_config(MatchConfig {
        method: Method::SqdiffNormed,
        schedule: ScaleSchedule::native_only(),
        max_occurrences: 1,
        ..MatchConfig::default()
    });
    c.bench_function("sqdiff_native_single", |b| {
        b.iter(|| black_box(sqdiff.find_all(&screen, &plan).unwrap()));
    });

    #[cfg(feature = "rayon")]
    {
        let parallel = Matcher::new(screenmatch::ParallelCorrelator).with_config(MatchConfig {
            parallel: true,
            ..MatchConfig::default()
        });
        c.bench_function("ccoeff_full_pyramid_rayon", |b| {
            b.iter(|| black_box(parallel.find_all(&screen, &plan).unwrap()));
        });
    }
}

criterion_group!(benches, bench_matcher);
criterion_main!(benches);
