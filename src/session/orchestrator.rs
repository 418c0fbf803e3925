//! One provider session run: a sender task pushing audio frames and a
//! receiver loop forwarding committed transcripts.
//!
//! The receiver is authoritative for shutdown. When the event stream ends
//! cleanly the receiver cancels the sender, waits for it (a send error
//! captured there fails the session), pushes the transcript terminator,
//! and closes the provider. When the event stream yields an error
//! the receiver does NOT push the terminator: the transcript channel stays
//! open so the caller can respawn a session over the same channels and the
//! collector keeps waiting through the handover.

use crate::error::Result;
use crate::provider::ProviderSession;
use crate::session::{RunningFlag, SharedAudioRx, StreamItem, TranscriptItem};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Run one session against `provider`: open the connection, stream audio
/// from `audio_rx`, and forward final transcript segments to
/// `transcript_tx`.
///
/// On a clean provider close this pushes [`StreamItem::End`] downstream and
/// returns `Ok(())`. On provider failure it returns the error without
/// pushing the terminator, leaving both channels usable by a respawned run.
pub async fn run_session(
    provider: Arc<dyn ProviderSession>,
    audio_rx: SharedAudioRx,
    transcript_tx: mpsc::Sender<TranscriptItem>,
    running: RunningFlag,
) -> Result<()> {
    if let Err(err) = provider.open().await {
        provider.close().await;
        return Err(err);
    }
    debug!(provider = provider.name(), "session open");

    // Sender task. Cancellation is cooperative (oneshot + select) rather
    // than abort() so the end_audio finalizer always runs exactly once.
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    let sender_provider = Arc::clone(&provider);
    let sender_rx = Arc::clone(&audio_rx);
    let sender_running = running.clone();
    let sender = tokio::spawn(async move {
        let mut send_error = None;
        loop {
            if !sender_running.is_set() {
                break;
            }
            let item = tokio::select! {
                _ = &mut cancel_rx => break,
                item = async { sender_rx.lock().await.recv().await } => item,
            };
            match item {
                Some(StreamItem::Data(frame)) => {
                    if let Err(err) = sender_provider.send_audio(&frame.pcm).await {
                        warn!(error = %err, "audio send failed, stopping sender");
                        send_error = Some(err);
                        break;
                    }
                }
                Some(StreamItem::End) | None => break,
            }
        }
        sender_provider.end_audio().await;
        send_error
    });

    let mut session_result = Ok(());
    {
        let mut events = provider.events();
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if !event.is_final {
                        continue;
                    }
                    let text = event.text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    debug!(provider = provider.name(), text, "transcript segment");
                    if transcript_tx
                        .send(StreamItem::Data(text.to_string()))
                        .await
                        .is_err()
                    {
                        // Collector is gone; nothing left to feed.
                        break;
                    }
                }
                Err(err) => {
                    session_result = Err(err);
                    break;
                }
            }
            if !running.is_set() {
                break;
            }
        }
    }

    let _ = cancel_tx.send(());
    let send_error = match sender.await {
        Ok(send_error) => send_error,
        Err(err) => {
            warn!(error = %err, "sender task panicked");
            None
        }
    };
    // When the event stream ends without an error the send failure is the
    // only evidence the session died, so it becomes the session result.
    // A receiver error stays authoritative over a later send error.
    if session_result.is_ok() {
        if let Some(err) = send_error {
            session_result = Err(err);
        }
    }

    if session_result.is_ok() {
        // Clean end: seal the transcript stream before tearing down.
        if transcript_tx.send(TranscriptItem::End).await.is_err() {
            debug!("transcript channel closed before terminator");
        }
    }

    provider.close().await;
    debug!(provider = provider.name(), "session closed");

    session_result
}
