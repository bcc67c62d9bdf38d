use screenloc::lowlevel::scale_u8_bilinear;
use screenloc::{
    FindStrategy, LocateRequest, LocatorConfig, MatchLocator, OwnedImage, Pattern, ScaleAdjuster,
    Scene, SimulatedClock, StaticCapture, ZnccBackend, ZnccConfig,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;

fn make_image(width: usize, height: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    OwnedImage::new(data, width, height).unwrap()
}

fn extract_patch(image: &OwnedImage, x: usize, y: usize, w: usize, h: usize) -> OwnedImage {
    OwnedImage::from_view(image.view().roi(x, y, w, h).unwrap()).unwrap()
}

fn locator(screen: OwnedImage, parallel: bool, scale_search: bool) -> MatchLocator {
    let backend = ZnccBackend::with_config(ZnccConfig {
        parallel,
        ..ZnccConfig::default()
    })
    .unwrap();
    MatchLocator::with_config(
        Arc::new(backend),
        Arc::new(StaticCapture::new(screen)),
        Arc::new(SimulatedClock::new()),
        LocatorConfig {
            scale_search,
            ..LocatorConfig::default()
        },
    )
    .unwrap()
}

fn bench_locate(c: &mut Criterion) {
    let screen = make_image(640, 400);
    let icon = Arc::new(Pattern::new("icon", Some(extract_patch(&screen, 300, 180, 32, 24))));
    let request = LocateRequest::new()
        .with_patterns(vec![icon])
        .with_strategy(FindStrategy::Best);

    let sequential = locator(screen.clone(), false, false);
    c.bench_function("locate_best_sequential", |b| {
        b.iter(|| black_box(sequential.locate(&request).unwrap()));
    });

    let parallel = locator(screen.clone(), true, false);
    c.bench_function("locate_best_parallel", |b| {
        b.iter(|| black_box(parallel.locate(&request).unwrap()));
    });

    let scaled = locator(screen, true, true);
    c.bench_function("locate_best_with_scale_search", |b| {
        b.iter(|| black_box(scaled.locate(&request).unwrap()));
    });
}

fn bench_scale_search(c: &mut Criterion) {
    let base = make_image(48, 48);
    let shown = scale_u8_bilinear(base.view(), 1.5).unwrap();
    let mut screen = make_image(320, 240);
    screen.paste(shown.view(), 100, 60);

    let pattern = Pattern::new("logo", Some(base));
    let scene = Scene::new("screen", screen);
    let adjuster = ScaleAdjuster::new(Arc::new(ZnccBackend::new()));

    c.bench_function("find_best_scale", |b| {
        b.iter(|| black_box(adjuster.find_best_scale(Some(&pattern), Some(&scene)).unwrap()));
    });
}

criterion_group!(benches, bench_locate, bench_scale_search);
criterion_main!(benches);
