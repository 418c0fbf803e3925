use anyhow::Result;
use clap::Parser;
use stt_bench::bench::{build_provider_specs, print_summary, run_benchmark};
use stt_bench::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Benchmark real-time STT providers against ground-truth transcripts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (TOML); defaults apply when missing
    #[arg(short, long, default_value = "stt-bench")]
    config: String,

    /// Add the in-memory mock provider (useful for dry runs)
    #[arg(long)]
    mock: bool,

    /// Override the assets directory from the config
    #[arg(long)]
    assets_dir: Option<String>,

    /// Override the output directory from the config
    #[arg(long)]
    out_dir: Option<String>,

    /// Playback speed multiplier: 1.0 = real time, 0 disables pacing
    #[arg(long)]
    realtime_factor: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(assets_dir) = args.assets_dir {
        cfg.bench.assets_dir = assets_dir;
    }
    if let Some(out_dir) = args.out_dir {
        cfg.bench.out_dir = out_dir;
    }
    if let Some(factor) = args.realtime_factor {
        cfg.stream.realtime_factor = factor;
    }

    info!(
        assets = %cfg.bench.assets_dir,
        out = %cfg.bench.out_dir,
        language = %cfg.bench.language,
        "stt-bench starting"
    );

    let specs = build_provider_specs(&cfg, args.mock);
    let (results, tsv_path) = run_benchmark(&cfg, specs, None).await?;

    let timestamp = tsv_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    print_summary(&results, timestamp.trim_end_matches("_benchmark"), &tsv_path);
    Ok(())
}
