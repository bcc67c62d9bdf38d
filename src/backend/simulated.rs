//! Deterministic backend that replays scripted hits.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::backend::{sort_hits_desc, Hit, QueryKind, SearchBackend, SearchQuery};
use crate::util::{ScreenLocError, ScreenLocResult};

#[derive(Debug)]
enum Script {
    Fixed(Vec<Hit>),
    /// One entry per searched screen; the last entry repeats.
    Sequence(Vec<Vec<Hit>>),
}

/// Search backend for runs without real screens.
///
/// Hits are scripted per pattern name and filtered by the query region and
/// similarity exactly like real hits would be. Patterns without a script
/// are never found.
///
/// Sequences model a changing screen: each [`QueryKind::Search`] moves to the
/// next frame, while [`QueryKind::ScaleTrial`] queries see the current frame
/// without advancing it. Scripts therefore mean the same with scale search
/// on or off.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    scripts: HashMap<String, Script>,
    failing: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
    frames: Mutex<HashMap<String, usize>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `hits` on every search for `pattern`.
    pub fn with_hits(mut self, pattern: impl Into<String>, hits: Vec<Hit>) -> Self {
        self.scripts.insert(pattern.into(), Script::Fixed(hits));
        self
    }

    /// Returns `frames[n]` on the n-th search for `pattern`, repeating the
    /// last frame once the sequence is exhausted. Scale trials do not count
    /// as searches.
    pub fn with_sequence(mut self, pattern: impl Into<String>, frames: Vec<Vec<Hit>>) -> Self {
        self.scripts.insert(pattern.into(), Script::Sequence(frames));
        self
    }

    /// Makes every search for `pattern` fail with a backend error.
    pub fn failing(mut self, pattern: impl Into<String>) -> Self {
        self.failing.insert(pattern.into());
        self
    }

    /// Number of queries issued for `pattern` so far, scale trials
    /// included.
    pub fn calls(&self, pattern: &str) -> usize {
        self.lock_calls().get(pattern).copied().unwrap_or(0)
    }

    /// Number of queries issued for any pattern so far.
    pub fn total_calls(&self) -> usize {
        self.lock_calls().values().sum()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self, pattern: &str) {
        *self.lock_calls().entry(pattern.to_string()).or_insert(0) += 1;
    }

    /// Frame a query for `pattern` sees; only searches advance the cursor.
    fn frame_for(&self, pattern: &str, kind: QueryKind) -> usize {
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        let cursor = frames.entry(pattern.to_string()).or_insert(0);
        let index = *cursor;
        if kind == QueryKind::Search {
            *cursor += 1;
        }
        index
    }
}

impl SearchBackend for SimulatedBackend {
    fn find(&self, query: &SearchQuery<'_>) -> ScreenLocResult<Vec<Hit>> {
        let name = query.pattern.name();
        self.record_call(name);
        let frame = self.frame_for(name, query.kind);
        if self.failing.contains(name) {
            return Err(ScreenLocError::Backend {
                reason: format!("simulated failure searching for {name}"),
            });
        }

        let scripted: &[Hit] = match self.scripts.get(name) {
            Some(Script::Fixed(hits)) => hits,
            Some(Script::Sequence(frames)) => match frames.len() {
                0 => &[],
                len => &frames[frame.min(len - 1)],
            },
            None => &[],
        };

        let mut hits: Vec<Hit> = scripted
            .iter()
            .copied()
            .filter(|hit| {
                query.region.contains(&hit.region) && hit.confidence >= query.min_similarity
            })
            .collect();
        sort_hits_desc(&mut hits);
        hits.truncate(query.max_hits);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedBackend;
    use crate::backend::{Hit, QueryKind, SearchBackend, SearchQuery};
    use crate::image::OwnedImage;
    use crate::model::Pattern;
    use crate::region::Region;

    fn query<'a>(pattern: &'a Pattern, image: &'a OwnedImage, region: Region) -> SearchQuery<'a> {
        SearchQuery {
            pattern,
            needle: image.view(),
            haystack: image.view(),
            region,
            min_similarity: 0.7,
            max_hits: 10,
            kind: QueryKind::Search,
        }
    }

    #[test]
    fn filters_by_region_and_similarity() {
        let backend = SimulatedBackend::new().with_hits(
            "ok",
            vec![
                Hit { region: Region::new(5, 5, 4, 4), confidence: 0.8 },
                Hit { region: Region::new(50, 50, 4, 4), confidence: 0.95 },
                Hit { region: Region::new(6, 6, 4, 4), confidence: 0.5 },
            ],
        );
        let image = OwnedImage::filled(2, 2, 0).unwrap();
        let pattern = Pattern::new("ok", None);
        let hits = backend
            .find(&query(&pattern, &image, Region::new(0, 0, 20, 20)))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].region, Region::new(5, 5, 4, 4));
        assert_eq!(backend.calls("ok"), 1);
    }

    #[test]
    fn sequences_advance_per_search() {
        let hit = Hit { region: Region::new(0, 0, 2, 2), confidence: 0.9 };
        let backend = SimulatedBackend::new().with_sequence("seq", vec![vec![hit], vec![]]);
        let image = OwnedImage::filled(2, 2, 0).unwrap();
        let pattern = Pattern::new("seq", None);
        let region = Region::new(0, 0, 10, 10);
        assert_eq!(backend.find(&query(&pattern, &image, region)).unwrap().len(), 1);
        assert!(backend.find(&query(&pattern, &image, region)).unwrap().is_empty());
        assert!(backend.find(&query(&pattern, &image, region)).unwrap().is_empty());
        assert_eq!(backend.total_calls(), 3);
    }

    #[test]
    fn failing_patterns_error() {
        let backend = SimulatedBackend::new().failing("bad");
        let image = OwnedImage::filled(2, 2, 0).unwrap();
        let pattern = Pattern::new("bad", None);
        assert!(backend
            .find(&query(&pattern, &image, Region::new(0, 0, 2, 2)))
            .is_err());
    }

    #[test]
    fn scale_trials_see_the_current_frame_without_advancing() {
        let hit = Hit { region: Region::new(0, 0, 2, 2), confidence: 0.9 };
        let backend = SimulatedBackend::new().with_sequence("seq", vec![vec![], vec![hit]]);
        let image = OwnedImage::filled(2, 2, 0).unwrap();
        let pattern = Pattern::new("seq", None);
        let region = Region::new(0, 0, 10, 10);
        let trial = SearchQuery {
            kind: QueryKind::ScaleTrial,
            ..query(&pattern, &image, region)
        };

        for _ in 0..3 {
            assert!(backend.find(&trial).unwrap().is_empty());
        }
        assert!(backend.find(&query(&pattern, &image, region)).unwrap().is_empty());
        assert_eq!(backend.find(&trial).unwrap().len(), 1);
        assert_eq!(backend.find(&query(&pattern, &image, region)).unwrap().len(), 1);
        assert_eq!(backend.calls("seq"), 6);
    }
}
