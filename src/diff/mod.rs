//! Transcript comparison: normalization, diff-based metrics, and the
//! optional semantic scoring hook.

pub mod normalize;
pub mod report;
pub mod semantic;

pub use normalize::normalize_text;
pub use report::DiffReport;
pub use semantic::{MetricResult, SemanticScorer};
