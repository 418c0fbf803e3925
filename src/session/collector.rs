//! Transcript collection: drain the transcript channel into an ordered
//! list of segments.

use crate::session::{RunningFlag, StreamItem, TranscriptItem};
use tokio::sync::mpsc;
use tracing::debug;

/// Receive transcript segments until the terminator arrives, the channel
/// closes, or `running` is cleared. Segments are trimmed and empty ones
/// dropped; arrival order is preserved.
///
/// The collector outlives individual provider sessions: a respawned session
/// feeding the same channel keeps appending to the same list.
pub async fn collect_transcripts(
    running: RunningFlag,
    mut rx: mpsc::Receiver<TranscriptItem>,
) -> Vec<String> {
    let mut segments = Vec::new();
    loop {
        if !running.is_set() {
            debug!(segments = segments.len(), "collector stopped early");
            break;
        }
        match rx.recv().await {
            Some(StreamItem::Data(text)) => {
                let text = text.trim();
                if !text.is_empty() {
                    segments.push(text.to_string());
                }
            }
            Some(StreamItem::End) | None => break,
        }
    }
    segments
}
