//! Configuration structs for the locating components.
//!
//! All fields are public and have defaults; validation happens once when a
//! config is handed to the component that uses it.

use std::time::Duration;

use crate::util::math::sanitize_similarity;
use crate::util::{ScreenLocError, ScreenLocResult};

/// Default similarity threshold for searches and comparisons.
pub const DEFAULT_SIMILARITY: f64 = 0.7;

/// Scale search configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleConfig {
    /// Scale factors to try on the pattern.
    pub candidates: Vec<f64>,
    /// Best matches below this similarity do not count for a scale.
    pub min_similarity: f64,
    /// Confidences closer than this are ties, resolved toward scale 1.0.
    pub tie_epsilon: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            candidates: vec![0.5, 0.7, 1.0, 1.3, 1.5, 2.0],
            min_similarity: DEFAULT_SIMILARITY,
            tie_epsilon: 0.01,
        }
    }
}

impl ScaleConfig {
    /// Validates the configuration, sorting and deduplicating candidates.
    pub fn validated(mut self) -> ScreenLocResult<Self> {
        if self.candidates.is_empty() {
            return Err(ScreenLocError::InvalidConfig(
                "at least one scale candidate is required",
            ));
        }
        if self
            .candidates
            .iter()
            .any(|&s| !s.is_finite() || s <= 0.0)
        {
            return Err(ScreenLocError::InvalidConfig(
                "scale candidates must be finite and positive",
            ));
        }
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(ScreenLocError::InvalidConfig(
                "tie_epsilon must be finite and non-negative",
            ));
        }
        self.candidates.sort_by(f64::total_cmp);
        self.candidates.dedup();
        self.min_similarity = sanitize_similarity(self.min_similarity, DEFAULT_SIMILARITY);
        Ok(self)
    }

    /// Smallest candidate scale.
    pub fn min_scale(&self) -> f64 {
        self.candidates.first().copied().unwrap_or(1.0)
    }

    /// Largest candidate scale.
    pub fn max_scale(&self) -> f64 {
        self.candidates.last().copied().unwrap_or(1.0)
    }
}

/// Configuration for [`crate::MatchLocator`].
#[derive(Clone, Debug, PartialEq)]
pub struct LocatorConfig {
    /// Delay between polls in the wait operations.
    pub poll_interval: Duration,
    /// Search each pattern at its best scale instead of always at 1.0.
    pub scale_search: bool,
    /// Merge adjacent declared regions before searching.
    pub merge_adjacent: bool,
    /// Maximum hits requested from the backend per pattern and region.
    pub max_hits_per_search: usize,
    /// Pixels added around a match region when verifying it.
    pub verify_margin: i32,
    /// Similarity a match must still reach to be considered present.
    pub verify_similarity: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            scale_search: true,
            merge_adjacent: true,
            max_hits_per_search: 100,
            verify_margin: 0,
            verify_similarity: DEFAULT_SIMILARITY,
        }
    }
}

impl LocatorConfig {
    pub fn validated(mut self) -> ScreenLocResult<Self> {
        if self.poll_interval.is_zero() {
            return Err(ScreenLocError::InvalidConfig("poll_interval must be non-zero"));
        }
        if self.max_hits_per_search == 0 {
            return Err(ScreenLocError::InvalidConfig(
                "max_hits_per_search must be at least 1",
            ));
        }
        if self.verify_margin < 0 {
            return Err(ScreenLocError::InvalidConfig(
                "verify_margin must be non-negative",
            ));
        }
        self.verify_similarity = sanitize_similarity(self.verify_similarity, DEFAULT_SIMILARITY);
        Ok(self)
    }
}

/// Pixel deltas for synthesized offset matches.
///
/// `(dx, dy)` is applied to the pointer position, `(dx2, dy2)` to the last
/// match's origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OffsetConfig {
    pub dx: i32,
    pub dy: i32,
    pub dx2: i32,
    pub dy2: i32,
}

impl OffsetConfig {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            ..Self::default()
        }
    }

    pub fn with_last_match_offset(mut self, dx2: i32, dy2: i32) -> Self {
        self.dx2 = dx2;
        self.dy2 = dy2;
        self
    }

    /// True when the pointer offset is zero.
    pub fn pointer_offset_is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// True when the last-match offset is zero.
    pub fn last_match_offset_is_zero(&self) -> bool {
        self.dx2 == 0 && self.dy2 == 0
    }
}
