//! Direct pairwise image comparison.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::backend::{QueryKind, SearchBackend, SearchQuery};
use crate::config::DEFAULT_SIMILARITY;
use crate::image::OwnedImage;
use crate::model::{Match, Pattern, Scene, StateImage};
use crate::trace::{trace_event, trace_span};
use crate::util::math::sanitize_similarity;
use crate::util::ScreenLocResult;

/// Orders two images by size envelope.
///
/// `Less` means `a` fits inside `b`, `Greater` that `b` fits inside `a`,
/// `Equal` that they have the same size. `None` when neither fits inside the
/// other.
pub fn envelope_order(a: &OwnedImage, b: &OwnedImage) -> Option<Ordering> {
    let a_fits = a.width() <= b.width() && a.height() <= b.height();
    let b_fits = b.width() <= a.width() && b.height() <= a.height();
    match (a_fits, b_fits) {
        (true, true) => Some(Ordering::Equal),
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => None,
    }
}

/// Scores how well one image appears in another.
///
/// The smaller image is searched in the larger one. Every "no result" case
/// returns [`Match::empty`]; only backend failures are errors.
pub struct ImageComparer {
    backend: Arc<dyn SearchBackend>,
    min_similarity: f64,
}

impl ImageComparer {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            min_similarity: DEFAULT_SIMILARITY,
        }
    }

    /// Sets the similarity a comparison must reach, clamped to `[0, 1]`.
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = sanitize_similarity(min_similarity, DEFAULT_SIMILARITY);
        self
    }

    pub fn min_similarity(&self) -> f64 {
        self.min_similarity
    }

    /// Compares two patterns.
    ///
    /// When nothing qualifies the empty match is named
    /// `"<needle> found in <haystack>"` and carries the haystack as its scene.
    pub fn compare(
        &self,
        a: Option<&Arc<Pattern>>,
        b: Option<&Arc<Pattern>>,
    ) -> ScreenLocResult<Match> {
        let (Some(a), Some(b)) = (a, b) else {
            return Ok(Match::empty());
        };
        let (Some(a_image), Some(b_image)) = (a.image(), b.image()) else {
            return Ok(Match::empty());
        };
        let (needle, needle_image, haystack, haystack_image) = match envelope_order(a_image, b_image) {
            Some(Ordering::Less | Ordering::Equal) => (a, a_image, b, b_image),
            Some(Ordering::Greater) => (b, b_image, a, a_image),
            None => return Ok(Match::empty()),
        };
        let _span = trace_span!(
            "compare",
            needle = needle.name(),
            haystack = haystack.name()
        )
        .entered();

        let scene = Arc::new(Scene::from_pattern(haystack));
        let hits = self.backend.find(&SearchQuery {
            pattern: needle,
            needle: needle_image.view(),
            haystack: haystack_image.view(),
            region: scene.bounds(),
            min_similarity: self.min_similarity,
            max_hits: 1,
            kind: QueryKind::Search,
        })?;

        let result = match hits.first().filter(|h| h.confidence >= self.min_similarity) {
            Some(hit) => Match::new(hit.region, hit.confidence)
                .with_source(Arc::clone(needle))
                .with_name(needle.name())
                .with_scene(scene),
            None => Match::empty()
                .with_name(format!("{} found in {}", needle.name(), haystack.name()))
                .with_scene(scene),
        };
        trace_event!("compare_done", confidence = result.confidence);
        Ok(result)
    }

    /// Compares every pattern in `candidates` with `target` and returns the
    /// best result; an empty list yields [`Match::empty`].
    pub fn compare_best(
        &self,
        candidates: &[Arc<Pattern>],
        target: Option<&Arc<Pattern>>,
    ) -> ScreenLocResult<Match> {
        let mut best: Option<Match> = None;
        for candidate in candidates {
            let result = self.compare(Some(candidate), target)?;
            if best.as_ref().map_or(true, |b| result.confidence > b.confidence) {
                best = Some(result);
            }
        }
        Ok(best.unwrap_or_else(Match::empty))
    }

    /// Compares the full cross product of two state images' patterns and
    /// returns the best pair.
    pub fn compare_state_images(&self, a: &StateImage, b: &StateImage) -> ScreenLocResult<Match> {
        let mut best: Option<Match> = None;
        for pa in a.patterns() {
            for pb in b.patterns() {
                let mut result = self.compare(Some(pa), Some(pb))?;
                if best.as_ref().map_or(true, |m| result.confidence > m.confidence) {
                    result.state_image = Some(a.name().to_string());
                    best = Some(result);
                }
            }
        }
        Ok(best.unwrap_or_else(Match::empty))
    }
}

#[cfg(test)]
mod tests {
    use super::envelope_order;
    use crate::image::OwnedImage;
    use std::cmp::Ordering;

    #[test]
    fn envelope_order_by_containment() {
        let small = OwnedImage::filled(4, 4, 0).unwrap();
        let wide = OwnedImage::filled(10, 4, 0).unwrap();
        let tall = OwnedImage::filled(4, 10, 0).unwrap();
        assert_eq!(envelope_order(&small, &wide), Some(Ordering::Less));
        assert_eq!(envelope_order(&wide, &small), Some(Ordering::Greater));
        assert_eq!(envelope_order(&small, &small), Some(Ordering::Equal));
        assert_eq!(envelope_order(&wide, &tall), None);
    }
}
