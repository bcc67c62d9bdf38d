//! SIMD-accelerated ZNCC kernel using the `wide` crate.
//!
//! The inner template pixel loop is vectorized to process 8 pixels at a time
//! using `f32x8`; the row remainder falls back to scalar code.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::scalar::ensure_fits;
use crate::kernel::{Kernel, ScanParams};
use crate::template::TemplatePlan;
use crate::util::ScreenLocResult;
use crate::ImageView;
use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load_u8x8_as_f32x8(slice: &[u8]) -> f32x8 {
    f32x8::from([
        slice[0] as f32,
        slice[1] as f32,
        slice[2] as f32,
        slice[3] as f32,
        slice[4] as f32,
        slice[5] as f32,
        slice[6] as f32,
        slice[7] as f32,
    ])
}

#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

#[inline]
fn hsum(v: f32x8) -> f32 {
    v.to_array().iter().sum()
}

/// SIMD ZNCC kernel.
pub struct ZnccSimd;

impl ZnccSimd {
    fn window(image: ImageView<'_, u8>, tpl: &TemplatePlan, x: usize, y: usize, min_var_i: f32) -> f32 {
        let tpl_width = tpl.width();
        let tpl_height = tpl.height();
        let t_prime = tpl.t_prime();
        let n = (tpl_width * tpl_height) as f32;
        let simd_end = tpl_width / LANES * LANES;

        let mut dot_vec = f32x8::ZERO;
        let mut sum_i_vec = f32x8::ZERO;
        let mut sum_i2_vec = f32x8::ZERO;
        let mut dot_s = 0.0f32;
        let mut sum_i_s = 0.0f32;
        let mut sum_i2_s = 0.0f32;

        for ty in 0..tpl_height {
            let Some(img_row) = image.row(y + ty) else {
                return f32::NEG_INFINITY;
            };
            let base = ty * tpl_width;

            let mut tx = 0;
            while tx < simd_end {
                let img_vals = load_u8x8_as_f32x8(&img_row[x + tx..]);
                let tpl_vals = load_f32x8(&t_prime[base + tx..]);
                dot_vec += tpl_vals * img_vals;
                sum_i_vec += img_vals;
                sum_i2_vec += img_vals * img_vals;
                tx += LANES;
            }

            while tx < tpl_width {
                let value = img_row[x + tx] as f32;
                dot_s += t_prime[base + tx] * value;
                sum_i_s += value;
                sum_i2_s += value * value;
                tx += 1;
            }
        }

        let dot = hsum(dot_vec) + dot_s;
        let sum_i = hsum(sum_i_vec) + sum_i_s;
        let sum_i2 = hsum(sum_i2_vec) + sum_i2_s;

        let var_i = sum_i2 - (sum_i * sum_i) / n;
        if var_i <= min_var_i {
            return f32::NEG_INFINITY;
        }

        let score = dot / (tpl.var_t() * var_i).sqrt();
        if score.is_finite() {
            score
        } else {
            f32::NEG_INFINITY
        }
    }
}

impl Kernel for ZnccSimd {
    type Plan = TemplatePlan;

    fn score_at(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        x: usize,
        y: usize,
        min_var_i: f32,
    ) -> f32 {
        let Ok((max_x, max_y)) = ensure_fits(image, tpl.width(), tpl.height()) else {
            return f32::NEG_INFINITY;
        };
        if x > max_x || y > max_y {
            return f32::NEG_INFINITY;
        }
        Self::window(image, tpl, x, y, min_var_i)
    }

    fn scan_full(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        params: ScanParams,
    ) -> ScreenLocResult<Vec<Peak>> {
        let (max_x, max_y) = ensure_fits(image, tpl.width(), tpl.height())?;
        if params.topk == 0 {
            return Ok(Vec::new());
        }

        let mut topk_buf = TopK::new(params.topk);
        for y in 0..=max_y {
            for x in 0..=max_x {
                let score = Self::window(image, tpl, x, y, params.min_var_i);
                if score >= params.min_score {
                    topk_buf.push(Peak { x, y, score });
                }
            }
        }

        Ok(topk_buf.into_sorted_desc())
    }
}
