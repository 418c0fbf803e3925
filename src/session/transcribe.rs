//! End-to-end transcription of one WAV asset against one provider:
//! pacer, session, and collector wired over bounded channels.

use crate::audio::stream_wav_file;
use crate::config::Config;
use crate::diff::{DiffReport, MetricResult, SemanticScorer};
use crate::error::{Result, SttError};
use crate::provider::ProviderSession;
use crate::session::{
    collect_transcripts, run_session, RunningFlag, SharedAudioRx, TranscriptItem,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// Outcome of one (provider, asset) benchmark run.
#[derive(Debug)]
pub struct AssetResult {
    pub provider: String,
    pub asset: String,
    pub transcript: String,
    pub expected: String,
    pub report: DiffReport,
    pub semantic: Option<MetricResult>,
    pub elapsed: Duration,
}

/// Stream `wav_path` into `provider` at real-time pace and return the full
/// transcript, final segments joined by single spaces.
///
/// The pacer, the session, and the collector run concurrently over bounded
/// channels. When the session dies mid-stream the pacer's backpressure or
/// closed-channel error is a symptom, not the cause; the session error is
/// the one returned.
pub async fn transcribe_wav_realtime(
    provider: Arc<dyn ProviderSession>,
    wav_path: impl AsRef<Path>,
    config: &Config,
) -> Result<String> {
    let wav_path = wav_path.as_ref();
    let running = RunningFlag::new();

    let (audio_tx, audio_rx) = mpsc::channel(config.stream.audio_queue_depth);
    let (transcript_tx, transcript_rx) = mpsc::channel(config.stream.transcript_queue_depth);
    let audio_rx: SharedAudioRx = Arc::new(Mutex::new(audio_rx));

    let collector = tokio::spawn(collect_transcripts(running.clone(), transcript_rx));

    let session = {
        let provider = Arc::clone(&provider);
        let audio_rx = Arc::clone(&audio_rx);
        let transcript_tx = transcript_tx.clone();
        let running = running.clone();
        tokio::spawn(async move {
            let result = run_session(provider, audio_rx, transcript_tx, running.clone()).await;
            if result.is_err() {
                // Stop the pacer; it would otherwise keep filling the
                // channel nobody drains.
                running.clear();
            }
            result
        })
    };

    let paced = stream_wav_file(
        wav_path,
        &audio_tx,
        &config.audio,
        &config.stream,
        &running,
    )
    .await;
    drop(audio_tx);

    let mut pacer_error = None;
    match paced {
        Ok(chunks) => info!(chunks, asset = %wav_path.display(), "audio streamed"),
        Err(SttError::Backpressure { .. }) | Err(SttError::Cancelled) if !running.is_set() => {
            // Session failure in flight; the session task carries the
            // authoritative error.
            warn!(asset = %wav_path.display(), "pacer stalled by failed session");
        }
        Err(err) => pacer_error = Some(err),
    }

    let session_result = match session.await {
        Ok(result) => result,
        Err(err) => Err(SttError::Other(format!("session task failed: {err}"))),
    };

    if let Err(err) = &session_result {
        // The failed session never pushed the terminator. Push it here so
        // the collector wakes up and returns what it has.
        warn!(provider = provider.name(), error = %err, "session failed");
        let _ = transcript_tx.send(TranscriptItem::End).await;
    }
    drop(transcript_tx);

    let segments = collector
        .await
        .map_err(|err| SttError::Other(format!("collector task failed: {err}")))?;

    if let Some(err) = pacer_error {
        return Err(err);
    }
    session_result?;

    Ok(segments.join(" "))
}

/// Transcribe one asset and score the transcript against its ground truth.
///
/// The semantic scorer is optional and fail-open: a scorer error is logged
/// and the result carries no semantic metric, but the run still counts.
pub async fn transcribe_and_diff(
    provider: Arc<dyn ProviderSession>,
    wav_path: &Path,
    truth_path: &Path,
    config: &Config,
    scorer: Option<&dyn SemanticScorer>,
) -> Result<AssetResult> {
    let expected = tokio::fs::read_to_string(truth_path)
        .await
        .map_err(|err| {
            SttError::Other(format!(
                "cannot read ground truth {}: {err}",
                truth_path.display()
            ))
        })?
        .trim()
        .to_string();

    let started = Instant::now();
    let transcript = transcribe_wav_realtime(Arc::clone(&provider), wav_path, config).await?;
    let elapsed = started.elapsed();

    let report = DiffReport::compute(&expected, &transcript);
    info!(
        provider = provider.name(),
        asset = %wav_path.display(),
        cer = report.cer,
        wer = report.wer,
        "scored"
    );

    let semantic = match scorer {
        Some(scorer) => match scorer.score(&expected, &transcript).await {
            Ok(metric) => Some(metric),
            Err(err) => {
                warn!(scorer = scorer.name(), error = %err, "semantic scoring failed");
                None
            }
        },
        None => None,
    };

    Ok(AssetResult {
        provider: provider.name().to_string(),
        asset: wav_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| wav_path.display().to_string()),
        transcript,
        expected,
        report,
        semantic,
        elapsed,
    })
}
