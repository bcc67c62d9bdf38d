//! Element location: region and scale resolution, search and reduction.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::{QueryKind, SearchBackend, SearchQuery};
use crate::config::{LocatorConfig, ScaleConfig};
use crate::image::resize::scale_u8_bilinear;
use crate::image::OwnedImage;
use crate::model::{Match, Pattern, Scene};
use crate::platform::{Clock, ScreenCapture};
use crate::region::Region;
use crate::search::resolver::RegionResolver;
use crate::search::scale::ScaleAdjuster;
use crate::search::{FindStrategy, LocateRequest};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::ScreenLocResult;

/// Locates patterns on screen and reduces the hits per [`FindStrategy`].
///
/// "Not found" is always an empty result. Only backend failures and
/// malformed pixel data surface as errors.
pub struct MatchLocator {
    pub(crate) backend: Arc<dyn SearchBackend>,
    pub(crate) capture: Arc<dyn ScreenCapture>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) scale: ScaleAdjuster,
    pub(crate) cfg: LocatorConfig,
}

/// Per-pattern search settings shared by every region of one locate call.
struct PatternSearch<'a> {
    scene: &'a Arc<Scene>,
    state_image: Option<&'a str>,
    min_similarity: f64,
    max_hits: usize,
    stop_at_first: bool,
}

impl MatchLocator {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        capture: Arc<dyn ScreenCapture>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scale: ScaleAdjuster::new(Arc::clone(&backend)),
            backend,
            capture,
            clock,
            cfg: LocatorConfig::default(),
        }
    }

    pub fn with_config(
        backend: Arc<dyn SearchBackend>,
        capture: Arc<dyn ScreenCapture>,
        clock: Arc<dyn Clock>,
        cfg: LocatorConfig,
    ) -> ScreenLocResult<Self> {
        let mut locator = Self::new(backend, capture, clock);
        locator.cfg = cfg.validated()?;
        Ok(locator)
    }

    /// Replaces the scale search configuration.
    pub fn with_scale_config(mut self, cfg: ScaleConfig) -> ScreenLocResult<Self> {
        self.scale = ScaleAdjuster::with_config(Arc::clone(&self.backend), cfg)?;
        Ok(self)
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.cfg
    }

    pub fn scale_adjuster(&self) -> &ScaleAdjuster {
        &self.scale
    }

    /// Captures the screen and locates the request's patterns in it.
    ///
    /// A failed capture yields an empty result.
    pub fn locate(&self, request: &LocateRequest) -> ScreenLocResult<Vec<Match>> {
        let Some(scene) = self.capture_scene() else {
            trace_debug!("capture_unavailable", patterns = request.target_count());
            return Ok(Vec::new());
        };
        let result = self.run(request, &scene, None);
        self.scale.forget_scene(scene.id());
        result
    }

    /// Like [`MatchLocator::locate`], searching only `region`.
    pub fn locate_in_region(
        &self,
        request: &LocateRequest,
        region: Region,
    ) -> ScreenLocResult<Vec<Match>> {
        let Some(scene) = self.capture_scene() else {
            return Ok(Vec::new());
        };
        let result = self.run(request, &scene, Some(region));
        self.scale.forget_scene(scene.id());
        result
    }

    /// Locates the request's patterns in a caller-owned scene.
    ///
    /// Scale decisions stay cached for this scene until
    /// [`ScaleAdjuster::forget_scene`] is called.
    pub fn locate_in_scene(
        &self,
        request: &LocateRequest,
        scene: &Arc<Scene>,
    ) -> ScreenLocResult<Vec<Match>> {
        self.run(request, scene, None)
    }

    /// Checks that a match is still present at its own region.
    ///
    /// Matches without a source pattern or pixels cannot be re-checked and
    /// are reported absent.
    pub fn verify_element(&self, element: &Match) -> ScreenLocResult<bool> {
        let Some(pattern) = element.source_pattern.as_ref() else {
            return Ok(false);
        };
        let Some(needle) = pattern.image() else {
            return Ok(false);
        };
        let Some(scene) = self.capture_scene() else {
            return Ok(false);
        };
        let Some(haystack) = scene.image() else {
            return Ok(false);
        };

        let region = element
            .region
            .expanded(self.cfg.verify_margin)
            .clamp_to(&scene.bounds());
        if region.is_empty() {
            return Ok(false);
        }
        let scale = if element.scale.is_finite() && element.scale > 0.0 {
            element.scale
        } else {
            1.0
        };
        let scaled = scaled_needle(needle, scale)?;
        let hits = self.backend.find(&SearchQuery {
            pattern,
            needle: scaled.view(),
            haystack: haystack.view(),
            region,
            min_similarity: self.cfg.verify_similarity,
            max_hits: 1,
            kind: QueryKind::Search,
        })?;
        Ok(hits
            .iter()
            .any(|hit| hit.confidence >= self.cfg.verify_similarity))
    }

    fn capture_scene(&self) -> Option<Arc<Scene>> {
        self.capture
            .capture_screen()
            .map(|image| Arc::new(Scene::new("screen", image)))
    }

    fn run(
        &self,
        request: &LocateRequest,
        scene: &Arc<Scene>,
        region: Option<Region>,
    ) -> ScreenLocResult<Vec<Match>> {
        let strategy = request.strategy();
        let _span = trace_span!(
            "locate",
            patterns = request.target_count(),
            strategy = strategy.as_str()
        )
        .entered();
        if scene.image().is_none() {
            return Ok(Vec::new());
        }

        let resolver = RegionResolver::new(scene.bounds()).with_merge(self.cfg.merge_adjacent);
        let max_hits = match strategy {
            FindStrategy::All => self.cfg.max_hits_per_search,
            FindStrategy::Best | FindStrategy::First | FindStrategy::Each => 1,
        };

        let mut per_pattern: Vec<Vec<Match>> = Vec::with_capacity(request.target_count());
        for (pattern, state_image) in request.targets() {
            let regions = match region {
                Some(region) => vec![region],
                None => resolver.resolve_pattern(request.search_regions(), pattern),
            };
            let search = PatternSearch {
                scene,
                state_image,
                min_similarity: request.similarity(),
                max_hits,
                stop_at_first: strategy == FindStrategy::First,
            };
            let matches = self.search_pattern(pattern, &regions, &search)?;
            learn_fixed_region(pattern, &matches);

            if strategy == FindStrategy::First {
                if let Some(first) = matches.into_iter().next() {
                    trace_event!("locate_done", matches = 1usize);
                    return Ok(vec![first]);
                }
                continue;
            }
            per_pattern.push(matches);
        }

        let reduced = reduce(strategy, per_pattern, request.max_matches());
        trace_event!("locate_done", matches = reduced.len());
        Ok(reduced)
    }

    /// Searches one pattern in each region, returning qualifying matches in
    /// region order.
    fn search_pattern(
        &self,
        pattern: &Arc<Pattern>,
        regions: &[Region],
        search: &PatternSearch<'_>,
    ) -> ScreenLocResult<Vec<Match>> {
        let (Some(needle), Some(haystack)) = (pattern.image(), search.scene.image()) else {
            trace_debug!("pattern_skipped_no_pixels", pattern = pattern.name());
            return Ok(Vec::new());
        };

        let bounds = search.scene.bounds();
        let regions: Vec<Region> = regions
            .iter()
            .map(|region| region.clamp_to(&bounds))
            .filter(|region| !region.is_empty())
            .collect();
        let Some(area) = regions.iter().copied().reduce(|a, b| a.union(&b)) else {
            trace_debug!("pattern_skipped_off_screen", pattern = pattern.name());
            return Ok(Vec::new());
        };

        // Scales are tried only where the pattern will be searched.
        let scale = if self.cfg.scale_search {
            self.scale.cached_scale_in(pattern, search.scene, area)?
        } else {
            1.0
        };
        let scaled = scaled_needle(needle, scale)?;

        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for &region in &regions {
            let hits = self.backend.find(&SearchQuery {
                pattern,
                needle: scaled.view(),
                haystack: haystack.view(),
                region,
                min_similarity: search.min_similarity,
                max_hits: search.max_hits,
                kind: QueryKind::Search,
            })?;
            for hit in hits {
                if hit.confidence < search.min_similarity || !seen.insert(hit.region) {
                    continue;
                }
                let mut found = Match::new(hit.region, hit.confidence)
                    .with_source(Arc::clone(pattern))
                    .with_name(pattern.name())
                    .with_scene(Arc::clone(search.scene));
                found.scale = scale;
                found.state_image = search.state_image.map(str::to_string);
                matches.push(found);
            }
            if search.stop_at_first && !matches.is_empty() {
                break;
            }
        }

        trace_debug!(
            "pattern_searched",
            pattern = pattern.name(),
            regions = regions.len(),
            scale = scale,
            matches = matches.len()
        );
        Ok(matches)
    }
}

fn scaled_needle(needle: &OwnedImage, scale: f64) -> ScreenLocResult<Cow<'_, OwnedImage>> {
    if scale == 1.0 {
        return Ok(Cow::Borrowed(needle));
    }
    Ok(Cow::Owned(scale_u8_bilinear(needle.view(), scale)?))
}

/// Stores the best match region on a fixed pattern that has none yet.
fn learn_fixed_region(pattern: &Pattern, matches: &[Match]) {
    if !pattern.is_fixed() || pattern.fixed_region().is_some() {
        return;
    }
    if let Some(best) = best_of(matches) {
        if pattern.set_fixed_region(best.region) {
            trace_debug!("fixed_region_learned", pattern = pattern.name());
        }
    }
}

/// Highest-confidence match, first one on ties.
fn best_of(matches: &[Match]) -> Option<&Match> {
    matches.iter().fold(None, |best: Option<&Match>, m| match best {
        Some(b) if b.confidence >= m.confidence => Some(b),
        _ => Some(m),
    })
}

fn reduce(strategy: FindStrategy, per_pattern: Vec<Vec<Match>>, max_matches: usize) -> Vec<Match> {
    match strategy {
        FindStrategy::All | FindStrategy::First => {
            let mut all: Vec<Match> = per_pattern.into_iter().flatten().collect();
            // Stable: equal confidences keep pattern input order.
            all.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            all.truncate(max_matches);
            all
        }
        FindStrategy::Best => {
            let all: Vec<Match> = per_pattern.into_iter().flatten().collect();
            best_of(&all).cloned().into_iter().collect()
        }
        FindStrategy::Each => {
            let mut each: Vec<Match> = per_pattern
                .iter()
                .filter_map(|matches| best_of(matches).cloned())
                .collect();
            each.truncate(max_matches);
            each
        }
    }
}
