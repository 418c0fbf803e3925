//! Benchmark layer: asset discovery, the parallel provider driver, and
//! report writing.

pub mod assets;
pub mod driver;
pub mod tsv;

pub use assets::{discover_assets, AssetPair};
pub use driver::{build_provider_specs, run_benchmark, ProviderSpec};
pub use tsv::{print_summary, write_tsv};

use crate::diff::{DiffReport, MetricResult};
use std::path::PathBuf;

/// One (provider, file) row of the benchmark. Failed runs carry the error
/// string instead of a report.
#[derive(Debug)]
pub struct BenchmarkResult {
    pub provider: String,
    pub file: String,
    pub report: Option<DiffReport>,
    pub report_path: Option<PathBuf>,
    pub semantic: Option<MetricResult>,
    pub error: Option<String>,
}
