//! Search backends: the single-pattern search primitive used by every
//! higher-level operation.
//!
//! A backend is selected once and shared by the scale adjuster, locator and
//! comparer. [`ZnccBackend`] searches pixels; [`SimulatedBackend`] replays
//! scripted hits for deterministic runs without real screens.

mod simulated;
mod zncc;

pub use simulated::SimulatedBackend;
pub use zncc::{ZnccBackend, ZnccConfig};

use crate::model::Pattern;
use crate::region::Region;
use crate::util::ScreenLocResult;
use crate::ImageView;

/// Why a query was issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryKind {
    /// Looking for the pattern itself.
    #[default]
    Search,
    /// Trying one candidate scale before the real search.
    ScaleTrial,
}

/// One single-scale search of a needle inside part of a haystack.
#[derive(Clone, Copy)]
pub struct SearchQuery<'a> {
    /// Pattern the needle pixels were derived from.
    pub pattern: &'a Pattern,
    /// Needle pixels, already scaled.
    pub needle: ImageView<'a, u8>,
    /// Full scene pixels.
    pub haystack: ImageView<'a, u8>,
    /// Area of the haystack to search, in scene coordinates.
    pub region: Region,
    /// Hits scoring below this are discarded.
    pub min_similarity: f64,
    /// Maximum number of hits to return.
    pub max_hits: usize,
    pub kind: QueryKind,
}

/// Raw search hit in scene coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub region: Region,
    pub confidence: f64,
}

/// Single-pattern search primitive.
///
/// "Nothing found" is an empty `Vec`; `Err` is reserved for infrastructure
/// failures and is propagated unchanged by every caller.
pub trait SearchBackend: Send + Sync {
    /// Returns hits sorted by descending confidence.
    fn find(&self, query: &SearchQuery<'_>) -> ScreenLocResult<Vec<Hit>>;
}

/// Sorts hits by descending confidence, then row-major position.
pub(crate) fn sort_hits_desc(hits: &mut [Hit]) {
    hits.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.region.y().cmp(&b.region.y()))
            .then_with(|| a.region.x().cmp(&b.region.x()))
    });
}
