//! Scalar reference kernel for ZNCC evaluation.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::{Kernel, ScanParams};
use crate::template::TemplatePlan;
use crate::util::{ScreenLocError, ScreenLocResult};
use crate::ImageView;

/// Scalar zero-mean normalized cross-correlation kernel.
pub struct ZnccScalar;

/// Checks that a `tpl_width` x `tpl_height` template fits inside `image`.
pub(crate) fn ensure_fits(
    image: ImageView<'_, u8>,
    tpl_width: usize,
    tpl_height: usize,
) -> ScreenLocResult<(usize, usize)> {
    let img_width = image.width();
    let img_height = image.height();
    if img_width < tpl_width || img_height < tpl_height {
        return Err(ScreenLocError::RoiOutOfBounds {
            x: 0,
            y: 0,
            width: tpl_width,
            height: tpl_height,
            img_width,
            img_height,
        });
    }
    Ok((img_width - tpl_width, img_height - tpl_height))
}

/// ZNCC score of the window at `(x, y)`; the caller guarantees it fits.
///
/// Returns negative infinity for flat windows (`var_i <= min_var_i`).
#[inline]
pub(crate) fn zncc_window(
    image: ImageView<'_, u8>,
    tpl: &TemplatePlan,
    x: usize,
    y: usize,
    min_var_i: f32,
) -> f32 {
    let tpl_width = tpl.width();
    let tpl_height = tpl.height();
    let t_prime = tpl.t_prime();
    let n = (tpl_width * tpl_height) as f32;

    let mut dot = 0.0f32;
    let mut sum_i = 0.0f32;
    let mut sum_i2 = 0.0f32;

    for ty in 0..tpl_height {
        let Some(img_row) = image.row(y + ty) else {
            return f32::NEG_INFINITY;
        };
        let base = ty * tpl_width;
        let window = &img_row[x..x + tpl_width];
        for (tx, &pixel) in window.iter().enumerate() {
            let value = pixel as f32;
            dot += t_prime[base + tx] * value;
            sum_i += value;
            sum_i2 += value * value;
        }
    }

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

impl Kernel for ZnccScalar {
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
        zncc_window(image, tpl, x, y, min_var_i)
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
                let score = zncc_window(image, tpl, x, y, params.min_var_i);
                if score >= params.min_score {
                    topk_buf.push(Peak { x, y, score });
                }
            }
        }

        Ok(topk_buf.into_sorted_desc())
    }
}
