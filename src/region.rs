//! Screen rectangles and request-level search areas.
//!
//! Coordinates are signed so regions derived from offsets or adjustments may
//! start off-screen; use [`Region::clamp_to`] before touching pixels.
//! Edge arithmetic saturates at the `i32` limits.

/// Axis-aligned rectangle in screen coordinates.
///
/// Width and height are never negative; zero-area regions are legal and
/// match nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl Region {
    /// Creates a region, clamping negative sizes to zero.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: w.max(0),
            h: h.max(0),
        }
    }

    /// Region spanning a `width` x `height` screen from the origin.
    pub fn full_screen(width: usize, height: usize) -> Self {
        Self::new(0, 0, to_i32(width), to_i32(height))
    }

    /// Creates the region spanning two corners, in any order.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(
            x1.min(x2),
            y1.min(y2),
            x2.saturating_sub(x1).saturating_abs(),
            y2.saturating_sub(y1).saturating_abs(),
        )
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn w(&self) -> i32 {
        self.w
    }

    pub fn h(&self) -> i32 {
        self.h
    }

    /// Exclusive right edge.
    pub fn x2(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge.
    pub fn y2(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Center point, rounded toward the origin.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.w / 2),
            self.y.saturating_add(self.h / 2),
        )
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x2() && y >= self.y && y < self.y2()
    }

    /// Returns true when `other` lies entirely inside this region.
    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x && other.y >= self.y && other.x2() <= self.x2() && other.y2() <= self.y2()
    }

    /// Returns true when the regions share a positive-area overlap.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.intersection(other).is_some()
    }

    /// Overlapping area of two regions, or `None` when they do not overlap.
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1)))
    }

    /// Smallest region covering both inputs.
    pub fn union(&self, other: &Region) -> Region {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        Region::new(
            x1,
            y1,
            self.x2().max(other.x2()).saturating_sub(x1),
            self.y2().max(other.y2()).saturating_sub(y1),
        )
    }

    /// Moves the region by `(dx, dy)`.
    pub fn offset(&self, dx: i32, dy: i32) -> Region {
        Region::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.w,
            self.h,
        )
    }

    /// Grows the region by `margin` pixels on every side.
    ///
    /// Negative margins shrink it; the size never goes below zero.
    pub fn expanded(&self, margin: i32) -> Region {
        Region::new(
            self.x.saturating_sub(margin),
            self.y.saturating_sub(margin),
            self.w.saturating_add(margin.saturating_mul(2)),
            self.h.saturating_add(margin.saturating_mul(2)),
        )
    }

    /// Restricts the region to `bounds`; disjoint regions collapse to an
    /// empty region at the bounds origin.
    pub fn clamp_to(&self, bounds: &Region) -> Region {
        self.intersection(bounds)
            .unwrap_or_else(|| Region::new(bounds.x, bounds.y, 0, 0))
    }

    /// Applies a [`MatchAdjustment`] to this region.
    pub fn adjusted(&self, adjustment: &MatchAdjustment) -> Region {
        let w = adjustment
            .absolute_w
            .unwrap_or(self.w.saturating_add(adjustment.add_w));
        let h = adjustment
            .absolute_h
            .unwrap_or(self.h.saturating_add(adjustment.add_h));
        Region::new(
            self.x.saturating_add(adjustment.add_x),
            self.y.saturating_add(adjustment.add_y),
            w,
            h,
        )
    }

    /// Pixel window `(x, y, width, height)` for use with image views.
    ///
    /// Returns `None` for empty regions or regions with negative origins.
    pub fn as_window(&self) -> Option<(usize, usize, usize, usize)> {
        if self.is_empty() || self.x < 0 || self.y < 0 {
            return None;
        }
        Some((
            self.x as usize,
            self.y as usize,
            self.w as usize,
            self.h as usize,
        ))
    }
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Merges consecutive regions that share a full edge.
///
/// A region absorbs the next one when its right edge meets the next left edge
/// with the same top and bottom, or when its bottom edge meets the next top
/// edge with the same left and right. Passes repeat until the list stops
/// shrinking, so the result depends only on the input order.
pub fn merge_adjacent(regions: &[Region]) -> Vec<Region> {
    let mut current = regions.to_vec();
    loop {
        let merged = merge_pass(&current);
        if merged.len() == current.len() {
            return merged;
        }
        current = merged;
    }
}

fn merge_pass(regions: &[Region]) -> Vec<Region> {
    let mut out = Vec::with_capacity(regions.len());
    let mut iter = regions.iter().copied();
    let Some(mut acc) = iter.next() else {
        return out;
    };
    for next in iter {
        if acc.x2() == next.x && acc.y == next.y && acc.y2() == next.y2() {
            acc = Region::new(acc.x, acc.y, next.x2().saturating_sub(acc.x), acc.h);
        } else if acc.y2() == next.y && acc.x == next.x && acc.x2() == next.x2() {
            acc = Region::new(acc.x, acc.y, acc.w, next.y2().saturating_sub(acc.y));
        } else {
            out.push(acc);
            acc = next;
        }
    }
    out.push(acc);
    out
}

/// Caller-supplied search areas attached to a locate request.
///
/// These take priority over anything a pattern declares for itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchRegions {
    regions: Vec<Region>,
}

impl SearchRegions {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn push(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl From<Vec<Region>> for SearchRegions {
    fn from(regions: Vec<Region>) -> Self {
        Self::new(regions)
    }
}

impl From<Region> for SearchRegions {
    fn from(region: Region) -> Self {
        Self::new(vec![region])
    }
}

/// Adjustment that derives a new region from a match region.
///
/// `add_*` fields shift and grow the source region; `absolute_*` sizes, when
/// set, replace the width or height outright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchAdjustment {
    pub add_x: i32,
    pub add_y: i32,
    pub add_w: i32,
    pub add_h: i32,
    pub absolute_w: Option<i32>,
    pub absolute_h: Option<i32>,
}
