//! Collaborators supplied by the host environment: screen capture, time and
//! pointer position.
//!
//! Real display capture and input devices live outside this crate; the
//! implementations here cover fixed images, scripted frame sequences and
//! simulated time for headless runs and tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::image::OwnedImage;
use crate::region::Region;

/// Source of scene pixels.
///
/// `None` means no scene is available; callers treat that as "nothing
/// found", never as a failure.
pub trait ScreenCapture: Send + Sync {
    fn capture_screen(&self) -> Option<OwnedImage>;

    /// Captures part of the screen; the default crops a full capture.
    fn capture_region(&self, region: Region) -> Option<OwnedImage> {
        let screen = self.capture_screen()?;
        let bounds = Region::full_screen(screen.width(), screen.height());
        let (x, y, w, h) = region.clamp_to(&bounds).as_window()?;
        let view = screen.view().roi(x, y, w, h).ok()?;
        OwnedImage::from_view(view).ok()
    }
}

/// Capture that always returns the same image.
#[derive(Clone, Debug)]
pub struct StaticCapture {
    image: Arc<OwnedImage>,
}

impl StaticCapture {
    pub fn new(image: OwnedImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

impl ScreenCapture for StaticCapture {
    fn capture_screen(&self) -> Option<OwnedImage> {
        Some(self.image.as_ref().clone())
    }
}

/// Capture that returns one frame per call, repeating the last frame.
///
/// `None` frames simulate failed captures.
#[derive(Debug)]
pub struct FrameSequence {
    frames: Vec<Option<OwnedImage>>,
    next: AtomicUsize,
}

impl FrameSequence {
    pub fn new(frames: Vec<Option<OwnedImage>>) -> Self {
        Self {
            frames,
            next: AtomicUsize::new(0),
        }
    }

    /// Number of captures taken so far.
    pub fn captures(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl ScreenCapture for FrameSequence {
    fn capture_screen(&self) -> Option<OwnedImage> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let last = self.frames.len().checked_sub(1)?;
        self.frames[index.min(last)].clone()
    }
}

/// Capture for environments without a display.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCapture;

impl ScreenCapture for NoCapture {
    fn capture_screen(&self) -> Option<OwnedImage> {
        None
    }
}

/// Monotonic time source and blocking sleep for poll loops.
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time and real thread sleeps.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock whose time only moves when slept on or advanced.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    nanos: AtomicU64,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Source of the current pointer position.
pub trait PointerPosition: Send + Sync {
    /// `None` when no pointer is available.
    fn position(&self) -> Option<(i32, i32)>;
}

/// Pointer parked at a fixed coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedPointer {
    pub x: i32,
    pub y: i32,
}

impl FixedPointer {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl PointerPosition for FixedPointer {
    fn position(&self) -> Option<(i32, i32)> {
        Some((self.x, self.y))
    }
}

/// Headless environments without a pointer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPointer;

impl PointerPosition for NoPointer {
    fn position(&self) -> Option<(i32, i32)> {
        None
    }
}
