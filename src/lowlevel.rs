//! Low-level building blocks for custom search backends.
//!
//! These expose template plans, kernel traits, scan helpers and candidate
//! pruning for pipelines beyond the high-level `MatchLocator` API. Most users
//! should prefer `MatchLocator`, `ImageComparer` and `ZnccBackend`.

pub use crate::candidate::nms::nms_2d;
pub use crate::candidate::topk::{Peak, TopK};
pub use crate::image::resize::{resize_u8_bilinear, scale_u8_bilinear};
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::zncc_scan_full_par;
pub use crate::kernel::scalar::ZnccScalar;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::ZnccSimd;
pub use crate::kernel::{Kernel, ScanParams};
pub use crate::template::TemplatePlan;
