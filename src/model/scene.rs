use std::sync::Arc;

use crate::image::OwnedImage;
use crate::model::{next_id, Pattern};
use crate::region::Region;

/// Haystack image patterns are searched in, usually a fresh screen capture.
///
/// Scenes are immutable snapshots; each one gets its own identity so cached
/// scale decisions never carry over to a different capture.
#[derive(Debug)]
pub struct Scene {
    id: u64,
    name: String,
    image: Option<Arc<OwnedImage>>,
}

impl Scene {
    pub fn new(name: impl Into<String>, image: OwnedImage) -> Self {
        Self::with_shared_image(name, Some(Arc::new(image)))
    }

    pub fn with_shared_image(name: impl Into<String>, image: Option<Arc<OwnedImage>>) -> Self {
        Self {
            id: next_id(),
            name: name.into(),
            image,
        }
    }

    /// Scene without pixels; nothing is ever found in it.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::with_shared_image(name, None)
    }

    /// Treats a pattern's pixels as a scene, sharing the buffer.
    pub fn from_pattern(pattern: &Pattern) -> Self {
        Self::with_shared_image(pattern.name(), pattern.shared_image())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> Option<&OwnedImage> {
        self.image.as_deref()
    }

    /// Full extent of the scene; empty when there are no pixels.
    pub fn bounds(&self) -> Region {
        match self.image() {
            Some(image) => Region::full_screen(image.width(), image.height()),
            None => Region::default(),
        }
    }
}
