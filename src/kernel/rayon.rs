//! Rayon-parallel kernels (feature-gated).
//!
//! Scenes are large compared to patterns, so work is split over placement
//! rows; each row keeps its own Top-K and the results are merged.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::scalar::{ensure_fits, zncc_window};
use crate::kernel::ScanParams;
use crate::template::TemplatePlan;
use crate::util::ScreenLocResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel full scan for the ZNCC kernel.
///
/// Produces the same peaks as the scalar scan, in the same order.
pub fn zncc_scan_full_par(
    image: ImageView<'_, u8>,
    tpl: &TemplatePlan,
    params: ScanParams,
) -> ScreenLocResult<Vec<Peak>> {
    let (max_x, max_y) = ensure_fits(image, tpl.width(), tpl.height())?;
    if params.topk == 0 {
        return Ok(Vec::new());
    }

    let merged = (0..=max_y)
        .into_par_iter()
        .map(|y| {
            let mut row_topk = TopK::new(params.topk);
            for x in 0..=max_x {
                let score = zncc_window(image, tpl, x, y, params.min_var_i);
                if score >= params.min_score {
                    row_topk.push(Peak { x, y, score });
                }
            }
            row_topk
        })
        .reduce(
            || TopK::new(params.topk),
            |mut acc, row| {
                acc.extend(row);
                acc
            },
        );

    Ok(merged.into_sorted_desc())
}
