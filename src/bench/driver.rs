//! Benchmark driver: providers run in parallel, each working through the
//! asset list sequentially (streaming is real-time, there is no rushing it).
//!
//! Providers are isolated from each other: one provider failing an asset,
//! or all of them, only produces failure rows. The run itself fails only
//! when there is nothing to benchmark at all.

use crate::bench::{discover_assets, write_tsv, AssetPair, BenchmarkResult};
use crate::config::Config;
use crate::diff::SemanticScorer;
use crate::error::{Result, SttError};
use crate::provider::{DeepgramConfig, DeepgramProvider, MockProvider, ProviderSession};
use crate::session::transcribe_and_diff;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

type ProviderFactory = Box<dyn Fn() -> Arc<dyn ProviderSession> + Send + Sync>;

/// Everything needed to run one provider: its display name and a factory
/// producing a fresh session per asset.
pub struct ProviderSpec {
    pub name: String,
    factory: ProviderFactory,
}

impl ProviderSpec {
    pub fn new(name: &str, factory: ProviderFactory) -> Self {
        Self {
            name: name.to_string(),
            factory,
        }
    }

    fn session(&self) -> Arc<dyn ProviderSession> {
        (self.factory)()
    }
}

/// Build the provider list from the environment. Providers without
/// credentials are skipped with a warning; `with_mock` adds the in-memory
/// provider for dry runs.
pub fn build_provider_specs(config: &Config, with_mock: bool) -> Vec<ProviderSpec> {
    let mut specs = Vec::new();

    match std::env::var("DEEPGRAM_API_KEY") {
        Ok(key) if !key.is_empty() => {
            let deepgram = DeepgramConfig::new(key, config.bench.language.clone(), &config.audio);
            specs.push(ProviderSpec::new(
                "deepgram",
                Box::new(move || {
                    Arc::new(DeepgramProvider::new(deepgram.clone())) as Arc<dyn ProviderSession>
                }),
            ));
        }
        _ => warn!("DEEPGRAM_API_KEY not set, skipping deepgram"),
    }

    if with_mock {
        specs.push(ProviderSpec::new(
            "mock",
            Box::new(|| Arc::new(MockProvider::new("mock")) as Arc<dyn ProviderSession>),
        ));
    }

    specs
}

async fn run_provider(
    spec: ProviderSpec,
    pairs: Vec<AssetPair>,
    timestamp: String,
    config: Config,
    scorer: Option<Arc<dyn SemanticScorer>>,
) -> Vec<BenchmarkResult> {
    let out_dir = Path::new(&config.bench.out_dir);
    let mut results = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let file = pair
            .wav
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pair.wav.display().to_string());
        info!(provider = %spec.name, %file, "processing");

        let run = transcribe_and_diff(
            spec.session(),
            &pair.wav,
            &pair.txt,
            &config,
            scorer.as_deref(),
        )
        .await;

        match run {
            Ok(outcome) => {
                let report_path =
                    out_dir.join(format!("{timestamp}_{}_{}.diff.html", spec.name, pair.stem()));
                let title = format!("{} / {}", spec.name, pair.stem());
                let detail = format!(
                    "provider: {}\nasset: {}\nelapsed: {:.1}s",
                    spec.name,
                    pair.wav.display(),
                    outcome.elapsed.as_secs_f64()
                );
                if let Err(err) = outcome.report.write_html(&report_path, &title, &detail) {
                    warn!(error = %err, "could not write HTML diff report");
                }
                info!(
                    provider = %spec.name,
                    %file,
                    wer = outcome.report.wer,
                    cer = outcome.report.cer,
                    "done"
                );
                results.push(BenchmarkResult {
                    provider: spec.name.clone(),
                    file,
                    report: Some(outcome.report),
                    report_path: Some(report_path),
                    semantic: outcome.semantic,
                    error: None,
                });
            }
            Err(err) => {
                error!(provider = %spec.name, %file, error = %err, "failed");
                results.push(BenchmarkResult {
                    provider: spec.name.clone(),
                    file,
                    report: None,
                    report_path: None,
                    semantic: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    results
}

/// Run every provider against every asset and write the TSV report.
/// Returns the flat result list and the report path.
pub async fn run_benchmark(
    config: &Config,
    specs: Vec<ProviderSpec>,
    scorer: Option<Arc<dyn SemanticScorer>>,
) -> Result<(Vec<BenchmarkResult>, PathBuf)> {
    if specs.is_empty() {
        return Err(SttError::Other(
            "no providers configured; set API keys in the environment".to_string(),
        ));
    }

    let pairs = discover_assets(Path::new(&config.bench.assets_dir))?;
    if pairs.is_empty() {
        return Err(SttError::Other(format!(
            "no WAV/TXT asset pairs found in {}",
            config.bench.assets_dir
        )));
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    info!(
        providers = specs.len(),
        assets = pairs.len(),
        "benchmark starting"
    );

    let tasks: Vec<_> = specs
        .into_iter()
        .map(|spec| {
            tokio::spawn(run_provider(
                spec,
                pairs.clone(),
                timestamp.clone(),
                config.clone(),
                scorer.clone(),
            ))
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        match task.await {
            Ok(provider_results) => results.extend(provider_results),
            Err(err) => return Err(SttError::Other(format!("provider task failed: {err}"))),
        }
    }

    let tsv_path = write_tsv(&results, Path::new(&config.bench.out_dir), &timestamp)?;
    info!(tsv = %tsv_path.display(), "benchmark complete");
    Ok((results, tsv_path))
}
