//! Bilinear rescaling for grayscale patterns.
//!
//! Destination pixel centers are mapped back to the source with
//! `src = (dst + 0.5) * (src_len / dst_len) - 0.5` and clamped to the valid
//! sample range. Equal source and destination sizes copy the input unchanged.

use crate::image::{ImageView, OwnedImage};
use crate::util::math::scaled_len;
use crate::util::{ScreenLocError, ScreenLocResult};

/// Rescales `src` by a uniform factor using bilinear sampling.
///
/// Output dimensions are `round(w * factor)` x `round(h * factor)`, at least
/// one pixel each.
pub fn scale_u8_bilinear(src: ImageView<'_, u8>, factor: f64) -> ScreenLocResult<OwnedImage> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ScreenLocError::InvalidConfig("scale factor must be positive"));
    }
    let dst_width = scaled_len(src.width(), factor);
    let dst_height = scaled_len(src.height(), factor);
    resize_u8_bilinear(src, dst_width, dst_height)
}

/// Resamples `src` to exactly `dst_width` x `dst_height` pixels.
pub fn resize_u8_bilinear(
    src: ImageView<'_, u8>,
    dst_width: usize,
    dst_height: usize,
) -> ScreenLocResult<OwnedImage> {
    if dst_width == 0 || dst_height == 0 {
        return Err(ScreenLocError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    let width = src.width();
    let height = src.height();
    if dst_width == width && dst_height == height {
        return OwnedImage::from_view(src);
    }

    let sx = width as f32 / dst_width as f32;
    let sy = height as f32 / dst_height as f32;
    let max_x = width as f32 - 1.0;
    let max_y = height as f32 - 1.0;
    let mut out = Vec::with_capacity(dst_width * dst_height);

    for y in 0..dst_height {
        let src_y = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, max_y);
        let y0 = src_y.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let fy = src_y - y0 as f32;
        let row0 = src.row(y0).ok_or(ScreenLocError::BufferTooSmall {
            needed: y0 * src.stride() + width,
            got: src.as_slice().len(),
        })?;
        let row1 = src.row(y1).ok_or(ScreenLocError::BufferTooSmall {
            needed: y1 * src.stride() + width,
            got: src.as_slice().len(),
        })?;

        for x in 0..dst_width {
            let src_x = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, max_x);
            let x0 = src_x.floor() as usize;
            let x1 = (x0 + 1).min(width - 1);
            let fx = src_x - x0 as f32;

            let a = row0[x0] as f32;
            let b = row0[x1] as f32;
            let c = row1[x0] as f32;
            let d = row1[x1] as f32;
            let top = a + (b - a) * fx;
            let bottom = c + (d - c) * fx;
            let value = top + (bottom - top) * fy;

            out.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }

    OwnedImage::new(out, dst_width, dst_height)
}
