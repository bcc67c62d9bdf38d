use std::sync::Arc;

use crate::model::{Pattern, Scene};
use crate::region::Region;
use crate::util::math::clamp_unit;

/// A located occurrence of a pattern, with its confidence.
///
/// "Nothing found" is a value, not an error: see [`Match::empty`].
#[derive(Clone, Debug)]
pub struct Match {
    /// Matched area in screen coordinates.
    pub region: Region,
    /// Similarity in `[0, 1]`.
    pub confidence: f64,
    /// Scale factor the pattern was resized by before matching.
    pub scale: f64,
    pub source_pattern: Option<Arc<Pattern>>,
    /// Name of the state image the pattern was searched for as part of.
    pub state_image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    /// Scene the match was found in.
    pub scene: Option<Arc<Scene>>,
}

impl Match {
    pub fn new(region: Region, confidence: f64) -> Self {
        Self {
            region,
            confidence: clamp_unit(confidence),
            scale: 1.0,
            source_pattern: None,
            state_image: None,
            name: None,
            text: None,
            scene: None,
        }
    }

    /// Sentinel for "nothing found": zero confidence and an empty region.
    pub fn empty() -> Self {
        Self::new(Region::default(), 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.confidence <= 0.0 && self.region.is_empty()
    }

    /// Click point of the match: the center of its region.
    pub fn location(&self) -> (i32, i32) {
        self.region.center()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_source(mut self, pattern: Arc<Pattern>) -> Self {
        self.source_pattern = Some(pattern);
        self
    }

    pub fn with_scene(mut self, scene: Arc<Scene>) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Name of the source pattern, if any.
    pub fn pattern_name(&self) -> Option<&str> {
        self.source_pattern.as_deref().map(Pattern::name)
    }
}

impl Default for Match {
    fn default() -> Self {
        Self::empty()
    }
}
