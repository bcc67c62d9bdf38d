//! Template planning for correlation kernels.
//!
//! The ZNCC backend builds a plan from the already-scaled needle on every
//! search; the plan covers one scan of one region.

mod plan;

pub use plan::TemplatePlan;
