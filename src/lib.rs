//! ScreenLoc locates reference patterns on captured screens.
//!
//! It resolves where to look, at what scale, and which candidate to trust
//! when several matches compete. Pixel search is zero-mean normalized
//! cross-correlation on grayscale images, with optional parallelism via the
//! `rayon` feature and SIMD kernels via `simd`. Screen capture, time and
//! pointer position are injected through the traits in [`platform`].

pub mod backend;
mod candidate;
pub mod config;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod model;
pub mod platform;
pub mod region;
pub mod search;
pub mod template;
mod trace;
pub mod util;

pub use backend::{
    Hit, QueryKind, SearchBackend, SearchQuery, SimulatedBackend, ZnccBackend, ZnccConfig,
};
pub use config::{LocatorConfig, OffsetConfig, ScaleConfig};
pub use image::{ImageView, OwnedImage};
pub use model::{Match, Pattern, Scene, StateImage};
pub use platform::{
    Clock, FixedPointer, FrameSequence, NoCapture, NoPointer, PointerPosition, ScreenCapture,
    SimulatedClock, StaticCapture, SystemClock,
};
pub use region::{MatchAdjustment, Region, SearchRegions};
pub use search::{
    Cancellation, FindStrategy, ImageComparer, LocateRequest, MatchLocator, OffsetSynthesizer,
    RegionResolver, ScaleAdjuster, UiScale,
};
pub use util::{ScreenLocError, ScreenLocResult};
