//! Locating patterns in scenes.
//!
//! [`RegionResolver`] decides where to look, [`ScaleAdjuster`] at what scale,
//! and [`MatchLocator`] runs the searches and reduces raw hits according to a
//! [`FindStrategy`]. [`OffsetSynthesizer`] and [`ImageComparer`] are used
//! directly by calling layers for their own cases.

mod compare;
mod locator;
mod offset;
mod resolver;
mod scale;
mod wait;

use std::sync::Arc;

pub use compare::{envelope_order, ImageComparer};
pub use locator::MatchLocator;
pub use offset::OffsetSynthesizer;
pub use resolver::RegionResolver;
pub use scale::{ScaleAdjuster, UiScale};
pub use wait::Cancellation;

use crate::config::DEFAULT_SIMILARITY;
use crate::model::{Pattern, StateImage};
use crate::region::SearchRegions;
use crate::util::math::sanitize_similarity;

/// How raw matches are reduced into a result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FindStrategy {
    /// Every qualifying match, by descending confidence.
    #[default]
    All,
    /// The single highest-confidence match.
    Best,
    /// The first qualifying match; searching stops there.
    First,
    /// The best match of each pattern.
    Each,
}

impl FindStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindStrategy::All => "all",
            FindStrategy::Best => "best",
            FindStrategy::First => "first",
            FindStrategy::Each => "each",
        }
    }
}

/// What to look for, where, and how to reduce the results.
///
/// Plain patterns are searched before the patterns of state images, in input
/// order.
#[derive(Clone, Debug)]
pub struct LocateRequest {
    patterns: Vec<Arc<Pattern>>,
    state_images: Vec<StateImage>,
    search_regions: Option<SearchRegions>,
    strategy: FindStrategy,
    similarity: f64,
    max_matches: usize,
}

impl Default for LocateRequest {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            state_images: Vec::new(),
            search_regions: None,
            strategy: FindStrategy::All,
            similarity: DEFAULT_SIMILARITY,
            max_matches: usize::MAX,
        }
    }
}

impl LocateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patterns(mut self, patterns: Vec<Arc<Pattern>>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_state_images(mut self, state_images: Vec<StateImage>) -> Self {
        self.state_images = state_images;
        self
    }

    pub fn with_search_regions(mut self, regions: impl Into<SearchRegions>) -> Self {
        self.search_regions = Some(regions.into());
        self
    }

    pub fn with_strategy(mut self, strategy: FindStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the similarity threshold, clamped to `[0, 1]`.
    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = sanitize_similarity(similarity, DEFAULT_SIMILARITY);
        self
    }

    /// Caps the number of returned matches (at least 1).
    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches.max(1);
        self
    }

    pub fn patterns(&self) -> &[Arc<Pattern>] {
        &self.patterns
    }

    pub fn state_images(&self) -> &[StateImage] {
        &self.state_images
    }

    pub fn search_regions(&self) -> Option<&SearchRegions> {
        self.search_regions.as_ref()
    }

    pub fn strategy(&self) -> FindStrategy {
        self.strategy
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// Patterns in search order, with the state image each belongs to.
    pub(crate) fn targets(&self) -> impl Iterator<Item = (&Arc<Pattern>, Option<&str>)> + '_ {
        let plain = self.patterns.iter().map(|p| (p, None));
        let grouped = self
            .state_images
            .iter()
            .flat_map(|si| si.patterns().iter().map(move |p| (p, Some(si.name()))));
        plain.chain(grouped)
    }

    pub(crate) fn target_count(&self) -> usize {
        self.patterns.len()
            + self
                .state_images
                .iter()
                .map(|si| si.patterns().len())
                .sum::<usize>()
    }
}
