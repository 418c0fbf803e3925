//! Real-time audio pacing: replays a frame sequence into the bounded audio
//! channel at a configurable speed, with silence padding on both ends.

use crate::audio::{AudioFile, AudioFrame};
use crate::config::{AudioFormat, StreamConfig};
use crate::error::{Result, SttError};
use crate::session::{AudioItem, RunningFlag, StreamItem};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, info};

/// Push one item, giving up with a backpressure error if the channel stays
/// full past the budget. A session failure upstream usually explains the
/// backup; callers decide which error to surface.
async fn push(
    tx: &mpsc::Sender<AudioItem>,
    item: AudioItem,
    budget: Duration,
) -> Result<()> {
    match tx.send_timeout(item, budget).await {
        Ok(()) => Ok(()),
        Err(SendTimeoutError::Timeout(_)) => Err(SttError::Backpressure { budget }),
        Err(SendTimeoutError::Closed(_)) => Err(SttError::Cancelled),
    }
}

/// Stream silence chunks for `duration_secs`, paced like real audio.
/// Returns the number of chunks pushed, or early with the count so far if
/// the running flag is cleared.
async fn stream_silence(
    duration_secs: f64,
    tx: &mpsc::Sender<AudioItem>,
    format: &AudioFormat,
    stream: &StreamConfig,
    running: &RunningFlag,
) -> Result<usize> {
    if duration_secs <= 0.0 {
        return Ok(0);
    }

    let chunk = AudioFrame::silence(format, stream.chunk_duration());
    let chunk_secs = stream.chunk_ms as f64 / 1000.0;
    let mut total = 0.0;
    let mut chunks = 0;

    while total < duration_secs {
        if !running.is_set() {
            return Ok(chunks);
        }
        push(tx, StreamItem::Data(chunk.clone()), stream.backpressure_budget()).await?;
        if let Some(delay) = stream.pacing_delay() {
            tokio::time::sleep(delay).await;
        }
        total += chunk_secs;
        chunks += 1;
    }

    Ok(chunks)
}

/// Stream a WAV file into the audio channel with real-time pacing.
///
/// Validates the asset format eagerly, then pushes leading silence, the
/// audio frames, trailing silence, and finally the end-of-stream terminator.
/// Between pushes the pacer sleeps `chunk_ms × realtime_factor` (no sleep
/// when the factor is 0).
///
/// If the running flag is cleared mid-stream the pacer exits early without
/// pushing the terminator; unblocking downstream consumers on that path is
/// the caller's job.
///
/// Returns the total number of chunks streamed, silence included.
pub async fn stream_wav_file(
    path: impl AsRef<Path>,
    tx: &mpsc::Sender<AudioItem>,
    format: &AudioFormat,
    stream: &StreamConfig,
    running: &RunningFlag,
) -> Result<usize> {
    let path = path.as_ref();
    debug!("Streaming WAV file: {}", path.display());

    if stream.chunk_ms < 10 || stream.chunk_ms > 5000 {
        return Err(SttError::Other(format!(
            "chunk_ms must be between 10 and 5000, got {}",
            stream.chunk_ms
        )));
    }

    // Format validation happens here, before any pacing.
    let file = AudioFile::open(path, format)?;
    let frames = file.frames(stream.chunk_ms, format);
    let budget = stream.backpressure_budget();

    // Leading silence so the provider's VAD does not clip the first word.
    let mut total =
        stream_silence(stream.silence_padding_secs, tx, format, stream, running).await?;
    if !running.is_set() {
        return Ok(total);
    }

    let mut sent = 0usize;
    for frame in frames {
        if !running.is_set() {
            return Ok(total + sent);
        }
        push(tx, StreamItem::Data(frame), budget).await?;
        sent += 1;

        if sent % 20 == 0 {
            debug!("Streamed {} audio chunks", sent);
        }

        if let Some(delay) = stream.pacing_delay() {
            tokio::time::sleep(delay).await;
        }
    }
    total += sent;

    // Trailing silence lets the provider commit the final segment.
    total += stream_silence(stream.silence_padding_secs, tx, format, stream, running).await?;
    if !running.is_set() {
        return Ok(total);
    }

    info!(
        "WAV streaming done: {} chunks from {}, pushing terminator",
        total,
        path.display()
    );
    push(tx, StreamItem::End, budget).await?;

    Ok(total)
}
