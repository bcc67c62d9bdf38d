#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use screenloc::lowlevel::{zncc_scan_full_par, Kernel, ScanParams, TemplatePlan, ZnccScalar};
use screenloc::{
    FindStrategy, LocateRequest, LocatorConfig, MatchLocator, OwnedImage, Pattern, SimulatedClock,
    StaticCapture, ZnccBackend, ZnccConfig,
};
use std::sync::Arc;

fn noise(width: usize, height: usize, seed: u64) -> OwnedImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height).map(|_| rng.random_range(0..=255)).collect();
    OwnedImage::new(data, width, height).unwrap()
}

#[test]
fn parallel_scan_matches_scalar_scan() {
    let mut image = noise(96, 64, 1);
    let tpl_image = noise(12, 10, 2);
    image.paste(tpl_image.view(), 30, 40);
    image.paste(tpl_image.view(), 70, 5);
    let plan = TemplatePlan::from_view(tpl_image.view()).unwrap();

    for topk in [1, 5, 40] {
        let params = ScanParams {
            topk,
            min_var_i: 1e-8,
            min_score: -1.0,
        };
        let scalar = <ZnccScalar as Kernel>::scan_full(image.view(), &plan, params).unwrap();
        let parallel = zncc_scan_full_par(image.view(), &plan, params).unwrap();

        assert_eq!(scalar.len(), topk);
        assert_eq!(parallel.len(), scalar.len());
        for (a, b) in scalar.iter().zip(&parallel) {
            assert_eq!((a.x, a.y), (b.x, b.y));
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }
}

#[test]
fn parallel_scan_rejects_oversized_templates() {
    let image = noise(8, 8, 3);
    let plan = TemplatePlan::from_view(noise(10, 4, 4).view()).unwrap();
    let params = ScanParams {
        topk: 3,
        min_var_i: 1e-8,
        min_score: -1.0,
    };
    assert!(zncc_scan_full_par(image.view(), &plan, params).is_err());
}

#[test]
fn parallel_backend_locates_like_sequential_backend() {
    let mut screen = noise(120, 80, 5);
    let icon = noise(14, 14, 6);
    screen.paste(icon.view(), 90, 50);
    let pattern = Arc::new(Pattern::new("icon", Some(icon)));
    let request = LocateRequest::new()
        .with_patterns(vec![pattern])
        .with_strategy(FindStrategy::Best);

    let run = |parallel: bool| {
        let backend = ZnccBackend::with_config(ZnccConfig {
            parallel,
            ..ZnccConfig::default()
        })
        .unwrap();
        let locator = MatchLocator::with_config(
            Arc::new(backend),
            Arc::new(StaticCapture::new(screen.clone())),
            Arc::new(SimulatedClock::new()),
            LocatorConfig {
                scale_search: false,
                ..LocatorConfig::default()
            },
        )
        .unwrap();
        locator.locate(&request).unwrap()
    };

    let sequential = run(false);
    let parallel = run(true);
    assert_eq!(sequential.len(), 1);
    assert_eq!(parallel.len(), 1);
    assert_eq!(sequential[0].region, parallel[0].region);
    assert!((sequential[0].confidence - parallel[0].confidence).abs() < 1e-6);
}
