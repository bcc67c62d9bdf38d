//! Template plan precomputation for ZNCC scoring.

use crate::image::ImageView;
use crate::util::{ScreenLocError, ScreenLocResult};

/// Precomputed statistics and zero-mean buffer for one (scaled) pattern.
///
/// With `t' = t - mean(t)` and `var_t = sum(t'^2)`, the ZNCC score at a
/// placement is `sum(t' * i) / sqrt(var_t * var_i)`, where `var_i` is the
/// un-normalized variance of the image window.
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f32,
    var_t: f32,
    t_prime: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    ///
    /// Flat templates (zero variance) cannot be correlated and are rejected
    /// with [`ScreenLocError::DegenerateTemplate`].
    pub fn from_view(tpl: ImageView<'_, u8>) -> ScreenLocResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(ScreenLocError::InvalidDimensions { width, height })?;

        let mut sum = 0.0f64;
        for y in 0..height {
            let row = plan_row(tpl, y)?;
            sum += row.iter().map(|&v| f64::from(v)).sum::<f64>();
        }
        let mean = sum / count as f64;

        let mut var_t = 0.0f64;
        let mut t_prime = Vec::with_capacity(count);
        for y in 0..height {
            for &value in plan_row(tpl, y)? {
                let centered = f64::from(value) - mean;
                var_t += centered * centered;
                t_prime.push(centered as f32);
            }
        }

        if var_t / count as f64 <= 1e-8 {
            return Err(ScreenLocError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            mean: mean as f32,
            var_t: var_t as f32,
            t_prime,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Returns the sum of squared deviations from the mean.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }
}

fn plan_row<'a>(tpl: ImageView<'a, u8>, y: usize) -> ScreenLocResult<&'a [u8]> {
    tpl.row(y).ok_or_else(|| {
        let needed = (y + 1)
            .checked_mul(tpl.stride())
            .and_then(|v| v.checked_add(tpl.width()))
            .unwrap_or(usize::MAX);
        ScreenLocError::BufferTooSmall {
            needed,
            got: tpl.as_slice().len(),
        }
    })
}
