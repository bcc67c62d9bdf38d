//! Patterns, scenes and the matches found between them.

mod matches;
mod pattern;
mod scene;

use std::sync::atomic::{AtomicU64, Ordering};

pub use matches::Match;
pub use pattern::{Pattern, StateImage};
pub use scene::Scene;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity for patterns and scenes.
fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
