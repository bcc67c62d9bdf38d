use std::sync::{Arc, OnceLock};

use crate::image::OwnedImage;
use crate::model::{next_id, Match};
use crate::region::{MatchAdjustment, Region};

/// Reference image searched for within a scene.
///
/// A pattern marked fixed trusts its first confirmed location: once the fixed
/// region is set it dominates every other region source and is never
/// overwritten.
#[derive(Debug)]
pub struct Pattern {
    id: u64,
    name: String,
    image: Option<Arc<OwnedImage>>,
    declared_regions: Vec<Region>,
    fixed: bool,
    fixed_region: OnceLock<Region>,
}

impl Pattern {
    /// Creates a pattern; `None` pixels make it unsearchable but still valid.
    pub fn new(name: impl Into<String>, image: Option<OwnedImage>) -> Self {
        Self::with_shared_image(name, image.map(Arc::new))
    }

    /// Creates a pattern around pixels shared with other patterns or scenes.
    pub fn with_shared_image(name: impl Into<String>, image: Option<Arc<OwnedImage>>) -> Self {
        Self {
            id: next_id(),
            name: name.into(),
            image,
            declared_regions: Vec::new(),
            fixed: false,
            fixed_region: OnceLock::new(),
        }
    }

    /// Sets the regions this pattern normally appears in.
    pub fn with_declared_regions(mut self, regions: Vec<Region>) -> Self {
        self.declared_regions = regions;
        self
    }

    /// Marks the pattern as fixed; its first located region will be kept.
    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Marks the pattern as fixed at a known region.
    pub fn with_fixed_region(mut self, region: Region) -> Self {
        self.fixed = true;
        self.fixed_region = OnceLock::from(region);
        self
    }

    /// Pins the fixed region relative to an anchor element's match.
    pub fn anchored_to(self, anchor: &Match, adjustment: &MatchAdjustment) -> Self {
        self.with_fixed_region(anchor.region.adjusted(adjustment))
    }

    /// Builds a fixed pattern from a previous match.
    ///
    /// Pixels come from the matched area of the match's scene when it is
    /// available, otherwise from the source pattern.
    pub fn from_match(m: &Match) -> Self {
        let cropped = m.scene.as_ref().and_then(|scene| {
            let image = scene.image()?;
            let (x, y, w, h) = m.region.clamp_to(&scene.bounds()).as_window()?;
            let view = image.view().roi(x, y, w, h).ok()?;
            OwnedImage::from_view(view).ok().map(Arc::new)
        });
        let image =
            cropped.or_else(|| m.source_pattern.as_ref().and_then(|p| p.shared_image()));
        let name = m
            .name
            .clone()
            .or_else(|| m.source_pattern.as_ref().map(|p| p.name().to_string()))
            .unwrap_or_default();
        Self::with_shared_image(name, image).with_fixed_region(m.region)
    }

    /// Process-unique identity used for cache keys.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> Option<&OwnedImage> {
        self.image.as_deref()
    }

    pub fn shared_image(&self) -> Option<Arc<OwnedImage>> {
        self.image.clone()
    }

    pub fn declared_regions(&self) -> &[Region] {
        &self.declared_regions
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn fixed_region(&self) -> Option<Region> {
        self.fixed_region.get().copied()
    }

    /// Stores the fixed region if none is set yet.
    ///
    /// Returns `true` only for the call that stored it.
    pub fn set_fixed_region(&self, region: Region) -> bool {
        self.fixed_region.set(region).is_ok()
    }
}

/// Named group of patterns that together identify one visual element.
#[derive(Clone, Debug, Default)]
pub struct StateImage {
    name: String,
    patterns: Vec<Arc<Pattern>>,
}

impl StateImage {
    pub fn new(name: impl Into<String>, patterns: Vec<Arc<Pattern>>) -> Self {
        Self {
            name: name.into(),
            patterns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[Arc<Pattern>] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Pattern;
    use crate::model::Match;
    use crate::region::{MatchAdjustment, Region};

    #[test]
    fn fixed_region_is_set_once() {
        let pattern = Pattern::new("button", None).with_fixed(true);
        assert!(pattern.fixed_region().is_none());
        assert!(pattern.set_fixed_region(Region::new(1, 2, 3, 4)));
        assert!(!pattern.set_fixed_region(Region::new(9, 9, 9, 9)));
        assert_eq!(pattern.fixed_region(), Some(Region::new(1, 2, 3, 4)));
    }

    #[test]
    fn ids_are_unique() {
        let a = Pattern::new("a", None);
        let b = Pattern::new("a", None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn anchored_pattern_is_fixed_beside_its_anchor() {
        let anchor = Match::new(Region::new(100, 50, 40, 20), 0.9);
        let label = Pattern::new("label", None).anchored_to(
            &anchor,
            &MatchAdjustment {
                add_x: 45,
                absolute_w: Some(120),
                ..MatchAdjustment::default()
            },
        );
        assert!(label.is_fixed());
        assert_eq!(label.fixed_region(), Some(Region::new(145, 50, 120, 20)));
    }
}
