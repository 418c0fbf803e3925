//! Optional semantic scoring hook.
//!
//! Edit-distance metrics punish harmless paraphrases as hard as real
//! recognition failures. A [`SemanticScorer`] plugs a meaning-aware judge
//! (an LLM, an embedding model) into the benchmark next to CER/WER. Scoring
//! is fail-open: a scorer error drops the metric for that run, never the
//! run itself.

use crate::error::Result;
use async_trait::async_trait;

/// One semantic metric value with a human-readable explanation.
#[derive(Debug, Clone)]
pub struct MetricResult {
    /// Similarity in percent, 0.0 (unrelated) to 100.0 (same meaning).
    pub score: f64,
    pub detail: String,
}

/// A meaning-aware transcript judge.
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    /// Metric name used as the report column header.
    fn name(&self) -> &str;

    /// Score `actual` against `expected`.
    async fn score(&self, expected: &str, actual: &str) -> Result<MetricResult>;
}
