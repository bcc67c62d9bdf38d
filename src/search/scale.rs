//! Scale search: compensating DPI and zoom differences between a pattern and
//! the live screen.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::backend::{QueryKind, SearchBackend, SearchQuery};
use crate::config::ScaleConfig;
use crate::image::resize::scale_u8_bilinear;
use crate::image::OwnedImage;
use crate::model::{Pattern, Scene};
use crate::region::Region;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::scaled_len;
use crate::util::ScreenLocResult;

/// Detected interface scale relative to a reference pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UiScale {
    pub scale_factor: f64,
    /// Width of the reference element as it appears on screen.
    pub reference_element_width: i32,
    /// Height of the reference element as it appears on screen.
    pub reference_element_height: i32,
}

/// Pattern id, scene id and searched area; `None` covers the whole scene.
type CacheKey = (u64, u64, Option<Region>);

/// Finds the scale at which a pattern best matches a scene.
///
/// Decisions are cached per (pattern, scene, area). Scenes are snapshots, so a
/// cached scale is only ever reused for the exact scene it was computed on;
/// call [`ScaleAdjuster::forget_scene`] once a scene is no longer searched.
pub struct ScaleAdjuster {
    backend: Arc<dyn SearchBackend>,
    cfg: ScaleConfig,
    cache: RwLock<HashMap<CacheKey, f64>>,
}

impl ScaleAdjuster {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            cfg: ScaleConfig::default(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_config(backend: Arc<dyn SearchBackend>, cfg: ScaleConfig) -> ScreenLocResult<Self> {
        Ok(Self {
            backend,
            cfg: cfg.validated()?,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.cfg
    }

    /// Returns the best candidate scale, or 1.0 when nothing qualifies.
    ///
    /// Missing inputs or pixels return 1.0 without searching. Backend errors
    /// are returned unchanged.
    pub fn find_best_scale(
        &self,
        pattern: Option<&Pattern>,
        scene: Option<&Scene>,
    ) -> ScreenLocResult<f64> {
        let (Some(pattern), Some(scene)) = (pattern, scene) else {
            return Ok(1.0);
        };
        self.find_best_scale_in(pattern, scene, scene.bounds())
    }

    /// Like [`ScaleAdjuster::find_best_scale`], probing only `area` of the
    /// scene.
    pub fn find_best_scale_in(
        &self,
        pattern: &Pattern,
        scene: &Scene,
        area: Region,
    ) -> ScreenLocResult<f64> {
        Ok(self
            .search_scales(pattern, scene, area)?
            .map_or(1.0, |(scale, _)| scale))
    }

    /// Reports the winning scale together with the on-screen element size.
    pub fn detect_ui_scale(
        &self,
        pattern: Option<&Pattern>,
        scene: Option<&Scene>,
    ) -> ScreenLocResult<Option<UiScale>> {
        let (Some(pattern), Some(scene)) = (pattern, scene) else {
            return Ok(None);
        };
        let Some(image) = pattern.image() else {
            return Ok(None);
        };
        let found = self.search_scales(pattern, scene, scene.bounds())?;
        Ok(found.map(|(scale, _)| UiScale {
            scale_factor: scale,
            reference_element_width: scaled_len(image.width(), scale) as i32,
            reference_element_height: scaled_len(image.height(), scale) as i32,
        }))
    }

    /// Like [`ScaleAdjuster::find_best_scale`], reusing the decision for this
    /// exact pattern and scene.
    pub fn cached_scale(&self, pattern: &Pattern, scene: &Scene) -> ScreenLocResult<f64> {
        self.cached_scale_in(pattern, scene, scene.bounds())
    }

    /// Like [`ScaleAdjuster::find_best_scale_in`], reusing the decision for
    /// this exact pattern, scene and area.
    pub fn cached_scale_in(
        &self,
        pattern: &Pattern,
        scene: &Scene,
        area: Region,
    ) -> ScreenLocResult<f64> {
        let key = cache_key(pattern, scene, area);
        if let Some(&scale) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            trace_debug!("scale_cache_hit", pattern = pattern.name(), scale = scale);
            return Ok(scale);
        }

        let scale = self.find_best_scale_in(pattern, scene, area)?;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, scale);
        Ok(scale)
    }

    /// Cached whole-scene decision for a pattern and scene, if any.
    pub fn cached(&self, pattern_id: u64, scene_id: u64) -> Option<f64> {
        self.lookup(&(pattern_id, scene_id, None))
    }

    /// Cached decision for a pattern tried in `area` of a scene, if any.
    pub fn cached_in(&self, pattern: &Pattern, scene: &Scene, area: Region) -> Option<f64> {
        self.lookup(&cache_key(pattern, scene, area))
    }

    fn lookup(&self, key: &CacheKey) -> Option<f64> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Drops every cached decision made on `scene_id`.
    pub fn forget_scene(&self, scene_id: u64) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|&(_, scene, _), _| scene != scene_id);
    }

    /// Tries every candidate scale that fits inside `area` and returns the
    /// winner with its confidence.
    fn search_scales(
        &self,
        pattern: &Pattern,
        scene: &Scene,
        area: Region,
    ) -> ScreenLocResult<Option<(f64, f64)>> {
        let (Some(needle), Some(haystack)) = (pattern.image(), scene.image()) else {
            trace_debug!("scale_skipped_no_pixels", pattern = pattern.name());
            return Ok(None);
        };
        let area = area.clamp_to(&scene.bounds());
        if area.is_empty() {
            return Ok(None);
        }
        let _span = trace_span!(
            "find_best_scale",
            pattern = pattern.name(),
            candidates = self.cfg.candidates.len()
        )
        .entered();

        let mut scored: Vec<(f64, f64)> = Vec::with_capacity(self.cfg.candidates.len());
        for &scale in &self.cfg.candidates {
            let width = scaled_len(needle.width(), scale);
            let height = scaled_len(needle.height(), scale);
            if width > area.w() as usize || height > area.h() as usize {
                continue;
            }
            let scaled: Cow<'_, OwnedImage> = if scale == 1.0 {
                Cow::Borrowed(needle)
            } else {
                Cow::Owned(scale_u8_bilinear(needle.view(), scale)?)
            };
            let hits = self.backend.find(&SearchQuery {
                pattern,
                needle: scaled.view(),
                haystack: haystack.view(),
                region: area,
                min_similarity: self.cfg.min_similarity,
                max_hits: 1,
                kind: QueryKind::ScaleTrial,
            })?;
            if let Some(best) = hits.first().filter(|h| h.confidence >= self.cfg.min_similarity) {
                scored.push((scale, best.confidence));
            }
        }

        let selected = select_scale(&scored, self.cfg.tie_epsilon);
        if let Some((scale, confidence)) = selected {
            trace_event!("scale_selected", scale = scale, confidence = confidence);
        }
        Ok(selected)
    }
}

fn cache_key(pattern: &Pattern, scene: &Scene, area: Region) -> CacheKey {
    let bounds = scene.bounds();
    let area = area.clamp_to(&bounds);
    (pattern.id(), scene.id(), (area != bounds).then_some(area))
}

/// Highest confidence wins; confidences within `epsilon` of the best are
/// ties, resolved toward scale 1.0 and then toward the smaller scale.
fn select_scale(scored: &[(f64, f64)], epsilon: f64) -> Option<(f64, f64)> {
    let top = scored.iter().map(|&(_, c)| c).fold(f64::NEG_INFINITY, f64::max);
    scored
        .iter()
        .copied()
        .filter(|&(_, c)| top - c <= epsilon)
        .min_by(|a, b| {
            (a.0 - 1.0)
                .abs()
                .total_cmp(&(b.0 - 1.0).abs())
                .then_with(|| a.0.total_cmp(&b.0))
        })
}

#[cfg(test)]
mod tests {
    use super::select_scale;

    #[test]
    fn highest_confidence_wins_outside_epsilon() {
        let scored = [(0.5, 0.8), (1.0, 0.85), (2.0, 0.97)];
        assert_eq!(select_scale(&scored, 0.01), Some((2.0, 0.97)));
    }

    #[test]
    fn ties_prefer_scale_closest_to_one() {
        let scored = [(0.5, 0.95), (1.3, 0.955), (2.0, 0.951)];
        assert_eq!(select_scale(&scored, 0.01), Some((1.3, 0.955)));
        let symmetric = [(0.5, 0.9), (1.5, 0.9)];
        assert_eq!(select_scale(&symmetric, 0.01), Some((0.5, 0.9)));
    }

    #[test]
    fn nothing_scored_selects_nothing() {
        assert_eq!(select_scale(&[], 0.01), None);
    }
}
