//! Pixel search backend based on zero-mean normalized cross-correlation.

#[cfg(feature = "rayon")]
use crate::kernel::rayon::zncc_scan_full_par;
use crate::backend::{Hit, SearchBackend, SearchQuery};
use crate::candidate::nms::nms_2d;
use crate::candidate::topk::Peak;
use crate::kernel::{Kernel, ScanParams};
use crate::region::Region;
use crate::template::TemplatePlan;
use crate::trace::trace_debug;
use crate::util::math::clamp_unit;
use crate::util::{ScreenLocError, ScreenLocResult};
use crate::ImageView;

#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::ZnccScalar as Zncc;
#[cfg(feature = "simd")]
use crate::kernel::simd::ZnccSimd as Zncc;

/// Configuration for [`ZnccBackend`].
#[derive(Clone, Debug)]
pub struct ZnccConfig {
    /// Scan rows in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
    /// Windows with variance at or below this are skipped as flat.
    pub min_var_i: f32,
    /// Maximum raw peaks kept per scan before overlap suppression.
    pub scan_limit: usize,
    /// Drop weaker hits overlapping a stronger one by more than half the
    /// needle size.
    pub suppress_overlaps: bool,
}

impl Default for ZnccConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_var_i: 1e-8,
            scan_limit: 4096,
            suppress_overlaps: true,
        }
    }
}

/// ZNCC pixel search over grayscale scenes.
///
/// Scores are clamped to `[0, 1]`; flat needles have no defined correlation
/// and never match.
#[derive(Clone, Debug, Default)]
pub struct ZnccBackend {
    cfg: ZnccConfig,
}

impl ZnccBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(cfg: ZnccConfig) -> ScreenLocResult<Self> {
        if cfg.scan_limit == 0 {
            return Err(ScreenLocError::InvalidConfig("scan_limit must be at least 1"));
        }
        if !cfg.min_var_i.is_finite() || cfg.min_var_i < 0.0 {
            return Err(ScreenLocError::InvalidConfig(
                "min_var_i must be finite and non-negative",
            ));
        }
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &ZnccConfig {
        &self.cfg
    }

    fn scan(
        &self,
        image: ImageView<'_, u8>,
        plan: &TemplatePlan,
        params: ScanParams,
    ) -> ScreenLocResult<Vec<Peak>> {
        #[cfg(feature = "rayon")]
        if self.cfg.parallel {
            return zncc_scan_full_par(image, plan, params);
        }
        <Zncc as Kernel>::scan_full(image, plan, params)
    }
}

impl SearchBackend for ZnccBackend {
    fn find(&self, query: &SearchQuery<'_>) -> ScreenLocResult<Vec<Hit>> {
        if query.max_hits == 0 {
            return Ok(Vec::new());
        }
        let bounds = Region::full_screen(query.haystack.width(), query.haystack.height());
        let Some((x, y, width, height)) = query.region.clamp_to(&bounds).as_window() else {
            return Ok(Vec::new());
        };
        let needle_w = query.needle.width();
        let needle_h = query.needle.height();
        if needle_w > width || needle_h > height {
            return Ok(Vec::new());
        }

        let plan = match TemplatePlan::from_view(query.needle) {
            Ok(plan) => plan,
            Err(err) if err.is_invalid_input() => {
                trace_debug!("flat_needle", pattern = query.pattern.name());
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let roi = query.haystack.roi(x, y, width, height)?;
        let params = ScanParams {
            topk: self.cfg.scan_limit,
            min_var_i: self.cfg.min_var_i,
            min_score: clamp_unit(query.min_similarity) as f32,
        };
        let mut peaks = self.scan(roi, &plan, params)?;
        if self.cfg.suppress_overlaps {
            let radius = (needle_w.min(needle_h) / 2).max(1);
            peaks = nms_2d(&mut peaks, radius);
        }

        Ok(peaks
            .into_iter()
            .take(query.max_hits)
            .map(|peak| Hit {
                region: Region::new(
                    (x + peak.x) as i32,
                    (y + peak.y) as i32,
                    needle_w as i32,
                    needle_h as i32,
                ),
                confidence: clamp_unit(peak.score as f64),
            })
            .collect())
    }
}
