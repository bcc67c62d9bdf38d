//! Synthetic matches placed relative to the pointer or a previous match.

use std::sync::Arc;

use crate::config::OffsetConfig;
use crate::model::{Match, StateImage};
use crate::platform::PointerPosition;
use crate::region::Region;

/// Fabricates point matches without searching pixels.
///
/// Synthetic matches are 1x1 regions. A missing pointer falls back to the
/// screen origin.
pub struct OffsetSynthesizer {
    pointer: Arc<dyn PointerPosition>,
}

impl OffsetSynthesizer {
    pub fn new(pointer: Arc<dyn PointerPosition>) -> Self {
        Self { pointer }
    }

    /// Appends a match at the pointer position shifted by `(dx, dy)`.
    ///
    /// With `do_only_when_empty`, nothing happens if any collection has
    /// patterns. A zero offset never adds a match. Returns whether a match
    /// was added.
    pub fn add_offset_as_only_match(
        &self,
        collections: &[StateImage],
        matches: &mut Vec<Match>,
        offset: &OffsetConfig,
        do_only_when_empty: bool,
    ) -> bool {
        if do_only_when_empty && collections.iter().any(|c| !c.is_empty()) {
            return false;
        }
        if offset.pointer_offset_is_zero() {
            return false;
        }
        let (x, y) = self.pointer.position().unwrap_or((0, 0));
        let point = Region::new(x, y, 1, 1).offset(offset.dx, offset.dy);
        matches.push(Match::new(point, 1.0).with_name("offset"));
        true
    }

    /// Appends a copy of the last match moved to its origin plus
    /// `(dx2, dy2)`.
    ///
    /// Does nothing for an empty list or a zero offset. Returns whether a
    /// match was added.
    pub fn add_offset_as_last_match(&self, matches: &mut Vec<Match>, offset: &OffsetConfig) -> bool {
        if offset.last_match_offset_is_zero() {
            return false;
        }
        let Some(last) = matches.last() else {
            return false;
        };
        let mut synthetic = last.clone();
        synthetic.region =
            Region::new(last.region.x(), last.region.y(), 1, 1).offset(offset.dx2, offset.dy2);
        matches.push(synthetic);
        true
    }
}
