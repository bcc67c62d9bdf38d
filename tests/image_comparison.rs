use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use screenloc::{
    ImageComparer, OwnedImage, Pattern, Region, SimulatedBackend, StateImage, ZnccBackend,
};
use std::sync::Arc;

fn noise(width: usize, height: usize, seed: u64) -> OwnedImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height).map(|_| rng.random_range(0..=255)).collect();
    OwnedImage::new(data, width, height).unwrap()
}

fn crop(image: &OwnedImage, x: usize, y: usize, w: usize, h: usize) -> OwnedImage {
    OwnedImage::from_view(image.view().roi(x, y, w, h).unwrap()).unwrap()
}

fn pattern(name: &str, image: OwnedImage) -> Arc<Pattern> {
    Arc::new(Pattern::new(name, Some(image)))
}

fn comparer() -> ImageComparer {
    ImageComparer::new(Arc::new(ZnccBackend::new()))
}

#[test]
fn missing_inputs_give_zero_confidence() {
    let comparer = comparer();
    let a = pattern("a", noise(8, 8, 1));
    let no_pixels = Arc::new(Pattern::new("ghost", None));

    for result in [
        comparer.compare(Some(&a), None).unwrap(),
        comparer.compare(None, Some(&a)).unwrap(),
        comparer.compare(None, None).unwrap(),
        comparer.compare(Some(&a), Some(&no_pixels)).unwrap(),
        comparer.compare(Some(&no_pixels), Some(&a)).unwrap(),
    ] {
        assert_eq!(result.confidence, 0.0);
        assert!(result.is_empty());
    }
}

#[test]
fn smaller_image_is_searched_in_the_larger_one() {
    let screen = noise(64, 48, 2);
    let icon = crop(&screen, 20, 12, 16, 16);
    let big = pattern("screen", screen);
    let small = pattern("icon", icon);
    let comparer = comparer();

    for result in [
        comparer.compare(Some(&small), Some(&big)).unwrap(),
        comparer.compare(Some(&big), Some(&small)).unwrap(),
    ] {
        assert!(result.confidence > 0.99, "confidence {}", result.confidence);
        assert_eq!(result.region, Region::new(20, 12, 16, 16));
        assert_eq!(result.pattern_name(), Some("icon"));
        assert_eq!(result.scene.as_ref().unwrap().name(), "screen");
    }
}

#[test]
fn identical_images_compare_at_full_confidence() {
    let image = noise(20, 20, 3);
    let a = pattern("a", image.clone());
    let b = pattern("b", image);
    let result = comparer().compare(Some(&a), Some(&b)).unwrap();
    assert!(result.confidence > 0.99);
    assert_eq!(result.region, Region::new(0, 0, 20, 20));
}

#[test]
fn unmatched_pair_names_needle_and_haystack() {
    let needle = pattern("logo", noise(16, 16, 4));
    let haystack = pattern("desktop", noise(64, 64, 5));
    let result = comparer().compare(Some(&haystack), Some(&needle)).unwrap();

    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.name.as_deref(), Some("logo found in desktop"));
    assert_eq!(result.scene.as_ref().unwrap().name(), "desktop");
}

#[test]
fn incompatible_envelopes_do_not_search() {
    let backend = Arc::new(SimulatedBackend::new());
    let comparer = ImageComparer::new(backend.clone());
    let wide = pattern("wide", noise(30, 5, 6));
    let tall = pattern("tall", noise(5, 30, 7));

    let result = comparer.compare(Some(&wide), Some(&tall)).unwrap();
    assert!(result.is_empty());
    assert_eq!(backend.total_calls(), 0);
}

#[test]
fn best_of_list_keeps_highest_confidence() {
    let screen = noise(64, 64, 8);
    let target = pattern("screen", screen.clone());
    let candidates = vec![
        pattern("stranger", noise(12, 12, 9)),
        pattern("match", crop(&screen, 40, 8, 12, 12)),
        pattern("other", noise(12, 12, 10)),
    ];
    let comparer = comparer();

    let best = comparer.compare_best(&candidates, Some(&target)).unwrap();
    assert_eq!(best.pattern_name(), Some("match"));
    assert_eq!(best.region, Region::new(40, 8, 12, 12));

    let none = comparer.compare_best(&[], Some(&target)).unwrap();
    assert!(none.is_empty());
    let no_target = comparer.compare_best(&candidates, None).unwrap();
    assert_eq!(no_target.confidence, 0.0);
}

#[test]
fn state_images_compare_across_all_pattern_pairs() {
    let screen = noise(48, 48, 11);
    let a = StateImage::new(
        "toolbar",
        vec![
            pattern("unrelated", noise(10, 10, 12)),
            pattern("save", crop(&screen, 5, 30, 10, 10)),
        ],
    );
    let b = StateImage::new(
        "window",
        vec![
            pattern("blank", noise(48, 48, 13)),
            pattern("window", screen),
        ],
    );

    let best = comparer().compare_state_images(&a, &b).unwrap();
    assert_eq!(best.pattern_name(), Some("save"));
    assert_eq!(best.region, Region::new(5, 30, 10, 10));
    assert_eq!(best.state_image.as_deref(), Some("toolbar"));

    let empty = comparer()
        .compare_state_images(&StateImage::default(), &b)
        .unwrap();
    assert!(empty.is_empty());
}

#[test]
fn similarity_threshold_is_configurable() {
    let comparer = comparer().with_min_similarity(1.5);
    assert_eq!(comparer.min_similarity(), 1.0);
    let comparer = ImageComparer::new(Arc::new(ZnccBackend::new())).with_min_similarity(0.2);
    assert_eq!(comparer.min_similarity(), 0.2);
}

#[test]
fn backend_failures_propagate() {
    let comparer = ImageComparer::new(Arc::new(SimulatedBackend::new().failing("broken")));
    let a = pattern("broken", noise(4, 4, 14));
    let b = pattern("screen", noise(16, 16, 15));
    assert!(comparer.compare(Some(&a), Some(&b)).is_err());
}
