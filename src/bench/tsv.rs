//! TSV report writer. Metric columns come from [`DiffReport::metrics`], so
//! new metrics show up in reports without touching this module.

use crate::bench::BenchmarkResult;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Write one row per (provider, file) result, sorted by provider then file.
/// Failed runs keep their row with the metric cells blank and the error in
/// the last column.
pub fn write_tsv(results: &[BenchmarkResult], out_dir: &Path, timestamp: &str) -> Result<PathBuf> {
    let mut sorted: Vec<&BenchmarkResult> = results.iter().collect();
    sorted.sort_by(|a, b| (&a.provider, &a.file).cmp(&(&b.provider, &b.file)));

    // Column set comes from the first successful report.
    let metric_cols: Vec<&'static str> = sorted
        .iter()
        .find_map(|r| r.report.as_ref())
        .map(|report| report.metrics().into_iter().map(|(name, _)| name).collect())
        .unwrap_or_default();
    let with_semantic = sorted.iter().any(|r| r.semantic.is_some());

    let mut header: Vec<&str> = vec!["provider", "file"];
    header.extend(&metric_cols);
    if with_semantic {
        header.push("semantic_score");
    }
    header.push("diff_report");
    header.push("error");

    let mut lines = vec![header.join("\t")];
    for result in &sorted {
        let mut row = vec![result.provider.clone(), result.file.clone()];
        match &result.report {
            Some(report) => {
                let metrics = report.metrics();
                for col in &metric_cols {
                    let value = metrics
                        .iter()
                        .find(|(name, _)| name == col)
                        .map(|(_, value)| value.clone())
                        .unwrap_or_default();
                    row.push(value);
                }
            }
            None => row.extend(std::iter::repeat(String::new()).take(metric_cols.len())),
        }
        if with_semantic {
            row.push(
                result
                    .semantic
                    .as_ref()
                    .map(|m| format!("{:.1}", m.score))
                    .unwrap_or_default(),
            );
        }
        row.push(
            result
                .report_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        row.push(result.error.clone().unwrap_or_default());
        lines.push(row.join("\t"));
    }

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{timestamp}_benchmark.tsv"));
    std::fs::write(&path, lines.join("\n") + "\n")?;
    Ok(path)
}

/// Print the fixed-width results table to stdout.
pub fn print_summary(results: &[BenchmarkResult], timestamp: &str, tsv_path: &Path) {
    let mut sorted: Vec<&BenchmarkResult> = results.iter().collect();
    sorted.sort_by(|a, b| (&a.provider, &a.file).cmp(&(&b.provider, &b.file)));

    const WIDTH: usize = 72;
    println!("\n{}", "=".repeat(WIDTH));
    println!("BENCHMARK RESULTS — {timestamp}");
    println!("{}", "=".repeat(WIDTH));
    println!(
        "{:<16} {:<14} {:>6} {:>6} {:>6} {:>7} {:>5} {:>5}",
        "Provider", "File", "WER%", "CER%", "SER%", "Match%", "Exp", "Got"
    );
    println!("{}", "-".repeat(WIDTH));
    for result in &sorted {
        match &result.report {
            Some(report) => {
                let ser = result
                    .semantic
                    .as_ref()
                    .map(|m| format!("{:>5.1}%", m.score))
                    .unwrap_or_else(|| format!("{:>6}", "—"));
                println!(
                    "{:<16} {:<14} {:>5.1}% {:>5.1}% {ser} {:>6.1}% {:>5} {:>5}",
                    result.provider,
                    result.file,
                    report.wer,
                    report.cer,
                    report.match_percent,
                    report.chars_expected,
                    report.chars_actual,
                );
            }
            None => println!(
                "{:<16} {:<14} {:>6}  {}",
                result.provider,
                result.file,
                "FAILED",
                result.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    println!("{}", "=".repeat(WIDTH));
    println!("TSV: {}", tsv_path.display());
}
