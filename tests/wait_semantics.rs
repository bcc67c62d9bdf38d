use screenloc::{
    Cancellation, Clock, Hit, LocateRequest, LocatorConfig, Match, MatchLocator, OwnedImage,
    Pattern, Region, SimulatedBackend, SimulatedClock, StaticCapture,
};
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(100);

fn hit(x: i32, y: i32) -> Hit {
    Hit {
        region: Region::new(x, y, 4, 4),
        confidence: 0.9,
    }
}

fn locator(backend: Arc<SimulatedBackend>, clock: Arc<SimulatedClock>) -> MatchLocator {
    MatchLocator::with_config(
        backend,
        Arc::new(StaticCapture::new(OwnedImage::filled(100, 100, 0).unwrap())),
        clock,
        LocatorConfig {
            poll_interval: POLL,
            scale_search: false,
            ..LocatorConfig::default()
        },
    )
    .unwrap()
}

fn pattern(name: &str) -> Arc<Pattern> {
    Arc::new(Pattern::new(name, Some(OwnedImage::filled(4, 4, 0).unwrap())))
}

#[test]
fn wait_for_absent_element_times_out_after_the_deadline() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(SimulatedBackend::new());
    let locator = locator(backend.clone(), clock.clone());
    let request = LocateRequest::new().with_patterns(vec![pattern("never")]);

    let found = locator
        .wait_for_element(&request, Duration::from_secs(2))
        .unwrap();

    assert!(found.is_empty());
    let elapsed = clock.now();
    assert!(elapsed >= Duration::from_secs(2), "returned early: {elapsed:?}");
    assert!(elapsed <= Duration::from_secs(2) + POLL);
    assert_eq!(backend.calls("never"), 21);
}

#[test]
fn wait_returns_as_soon_as_element_appears() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(
        SimulatedBackend::new().with_sequence("late", vec![vec![], vec![], vec![hit(10, 10)]]),
    );
    let locator = locator(backend, clock.clone());
    let request = LocateRequest::new().with_patterns(vec![pattern("late")]);

    let found = locator
        .wait_for_element(&request, Duration::from_secs(5))
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(clock.now(), POLL * 2);
}

#[test]
fn zero_timeout_polls_once() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(SimulatedBackend::new());
    let locator = locator(backend.clone(), clock.clone());
    let request = LocateRequest::new().with_patterns(vec![pattern("never")]);

    assert!(locator
        .wait_for_element(&request, Duration::ZERO)
        .unwrap()
        .is_empty());
    assert_eq!(backend.calls("never"), 1);
    assert_eq!(clock.now(), Duration::ZERO);
}

#[test]
fn last_sleep_is_cut_short_at_the_deadline() {
    let clock = Arc::new(SimulatedClock::new());
    let locator = locator(Arc::new(SimulatedBackend::new()), clock.clone());
    let request = LocateRequest::new().with_patterns(vec![pattern("never")]);

    locator
        .wait_for_element(&request, Duration::from_millis(250))
        .unwrap();
    assert_eq!(clock.now(), Duration::from_millis(250));
}

#[test]
fn cancelled_wait_returns_not_found_without_polling() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(SimulatedBackend::new().with_hits("here", vec![hit(10, 10)]));
    let locator = locator(backend.clone(), clock);
    let request = LocateRequest::new().with_patterns(vec![pattern("here")]);
    let cancel = Cancellation::new();
    cancel.clone().cancel();

    assert!(cancel.is_cancelled());
    let found = locator
        .wait_for_element_with(&request, Duration::from_secs(10), &cancel)
        .unwrap();
    assert!(found.is_empty());
    assert_eq!(backend.calls("here"), 0);

    let element = Match::new(Region::new(10, 10, 4, 4), 0.9).with_source(pattern("here"));
    assert!(!locator
        .wait_for_vanish_with(&element, Duration::from_secs(10), &cancel)
        .unwrap());
}

#[test]
fn vanish_is_confirmed_once_element_disappears() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(SimulatedBackend::new().with_sequence(
        "dialog",
        vec![vec![hit(20, 20)], vec![hit(20, 20)], vec![hit(20, 20)], vec![]],
    ));
    let locator = locator(backend, clock.clone());
    let element = Match::new(Region::new(20, 20, 4, 4), 0.9).with_source(pattern("dialog"));

    assert!(locator
        .wait_for_vanish(&element, Duration::from_secs(2))
        .unwrap());
    assert_eq!(clock.now(), POLL * 3);
}

#[test]
fn vanish_times_out_while_element_stays() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(SimulatedBackend::new().with_hits("sticky", vec![hit(20, 20)]));
    let locator = locator(backend, clock.clone());
    let element = Match::new(Region::new(20, 20, 4, 4), 0.9).with_source(pattern("sticky"));

    assert!(!locator
        .wait_for_vanish(&element, Duration::from_secs(1))
        .unwrap());
    assert!(clock.now() >= Duration::from_secs(1));
}

#[test]
fn wait_propagates_backend_failures() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(SimulatedBackend::new().failing("broken"));
    let locator = locator(backend, clock);
    let request = LocateRequest::new().with_patterns(vec![pattern("broken")]);
    assert!(locator
        .wait_for_element(&request, Duration::from_secs(1))
        .is_err());
}

#[test]
fn scripted_screens_advance_once_per_poll_with_default_config() {
    let clock = Arc::new(SimulatedClock::new());
    let backend = Arc::new(
        SimulatedBackend::new().with_sequence("late", vec![vec![], vec![], vec![hit(10, 10)]]),
    );
    let locator = MatchLocator::new(
        backend.clone(),
        Arc::new(StaticCapture::new(OwnedImage::filled(100, 100, 0).unwrap())),
        clock.clone(),
    );
    assert!(locator.config().scale_search);
    let request = LocateRequest::new().with_patterns(vec![pattern("late")]);

    let found = locator
        .wait_for_element(&request, Duration::from_secs(5))
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].region, Region::new(10, 10, 4, 4));
    assert_eq!(found[0].scale, 1.0);
    assert_eq!(clock.now(), POLL * 2);
    // Three polls, each with six scale trials and one search.
    assert_eq!(backend.calls("late"), 21);
}
