use screenloc::{
    FixedPointer, Match, NoPointer, OffsetConfig, OffsetSynthesizer, OwnedImage, Pattern, Region,
    StateImage,
};
use std::sync::Arc;

fn at_pointer(x: i32, y: i32) -> OffsetSynthesizer {
    OffsetSynthesizer::new(Arc::new(FixedPointer::new(x, y)))
}

fn group(name: &str, patterns: usize) -> StateImage {
    let patterns = (0..patterns)
        .map(|i| Arc::new(Pattern::new(format!("{name}-{i}"), None)))
        .collect();
    StateImage::new(name, patterns)
}

#[test]
fn zero_offsets_never_change_the_matches() {
    let synth = at_pointer(100, 100);
    let mut matches = vec![Match::new(Region::new(10, 10, 5, 5), 0.9)];
    let zero = OffsetConfig::default();

    assert!(!synth.add_offset_as_only_match(&[], &mut matches, &zero, false));
    assert!(!synth.add_offset_as_last_match(&mut matches, &zero));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].region, Region::new(10, 10, 5, 5));
}

#[test]
fn only_match_lands_at_pointer_plus_offset() {
    let synth = at_pointer(500, 300);
    let mut matches = Vec::new();

    assert!(synth.add_offset_as_only_match(&[], &mut matches, &OffsetConfig::new(20, -10), true));
    assert_eq!(matches.len(), 1);
    let added = &matches[0];
    assert_eq!(added.region, Region::new(520, 290, 1, 1));
    assert_eq!(added.location(), (520, 290));
    assert_eq!(added.confidence, 1.0);
    assert_eq!(added.name.as_deref(), Some("offset"));
}

#[test]
fn missing_pointer_falls_back_to_origin() {
    let synth = OffsetSynthesizer::new(Arc::new(NoPointer));
    let mut matches = Vec::new();
    assert!(synth.add_offset_as_only_match(&[], &mut matches, &OffsetConfig::new(7, 9), false));
    assert_eq!(matches[0].region, Region::new(7, 9, 1, 1));
}

#[test]
fn only_when_empty_skips_populated_collections() {
    let synth = at_pointer(0, 0);
    let offset = OffsetConfig::new(5, 5);
    let mut matches = Vec::new();

    let populated = [group("empty", 0), group("buttons", 2)];
    assert!(!synth.add_offset_as_only_match(&populated, &mut matches, &offset, true));
    assert!(matches.is_empty());

    // Without the restriction the populated collections do not matter.
    assert!(synth.add_offset_as_only_match(&populated, &mut matches, &offset, false));
    assert_eq!(matches.len(), 1);

    let all_empty = [group("a", 0), group("b", 0)];
    assert!(synth.add_offset_as_only_match(&all_empty, &mut matches, &offset, true));
    assert_eq!(matches.len(), 2);
}

#[test]
fn last_match_copy_inherits_metadata() {
    let synth = at_pointer(0, 0);
    let source = Arc::new(Pattern::new(
        "ok",
        Some(OwnedImage::filled(4, 4, 0).unwrap()),
    ));
    let mut original = Match::new(Region::new(200, 100, 40, 20), 0.93)
        .with_source(Arc::clone(&source))
        .with_name("ok");
    original.state_image = Some("dialog".to_string());
    let mut matches = vec![Match::new(Region::new(0, 0, 2, 2), 0.8), original];

    let offset = OffsetConfig::default().with_last_match_offset(15, 5);
    assert!(synth.add_offset_as_last_match(&mut matches, &offset));
    assert_eq!(matches.len(), 3);

    let added = &matches[2];
    assert_eq!(added.region, Region::new(215, 105, 1, 1));
    assert_eq!(added.confidence, 0.93);
    assert_eq!(added.name.as_deref(), Some("ok"));
    assert_eq!(added.state_image.as_deref(), Some("dialog"));
    assert!(Arc::ptr_eq(added.source_pattern.as_ref().unwrap(), &source));
    assert_eq!(matches[1].region, Region::new(200, 100, 40, 20));
}

#[test]
fn last_match_needs_a_previous_match() {
    let synth = at_pointer(0, 0);
    let mut matches = Vec::new();
    let offset = OffsetConfig::default().with_last_match_offset(3, 3);
    assert!(!synth.add_offset_as_last_match(&mut matches, &offset));
    assert!(matches.is_empty());
}

#[test]
fn offsets_saturate_at_screen_coordinate_limits() {
    let synth = at_pointer(i32::MAX - 1, i32::MIN + 1);
    let mut matches = Vec::new();
    assert!(synth.add_offset_as_only_match(&[], &mut matches, &OffsetConfig::new(10, -10), false));
    assert_eq!(matches[0].region, Region::new(i32::MAX, i32::MIN, 1, 1));

    let offset = OffsetConfig::default().with_last_match_offset(5, -5);
    assert!(synth.add_offset_as_last_match(&mut matches, &offset));
    assert_eq!(matches[1].region, Region::new(i32::MAX, i32::MIN, 1, 1));
    assert_eq!(matches[1].name.as_deref(), Some("offset"));
}
