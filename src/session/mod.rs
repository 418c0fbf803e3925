//! Session layer: the provider-agnostic streaming core.
//!
//! Audio flows `pacer → [audio channel] → orchestrator → provider`, and
//! transcripts flow `provider → orchestrator → [transcript channel] →
//! collector`. Both channels carry a tagged [`StreamItem`] so end-of-stream
//! is unambiguous even for legitimately empty payloads.

pub mod collector;
pub mod orchestrator;
pub mod transcribe;

pub use collector::collect_transcripts;
pub use orchestrator::run_session;
pub use transcribe::{transcribe_and_diff, transcribe_wav_realtime, AssetResult};

use crate::audio::AudioFrame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// A channel item: either a payload or the end-of-stream terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem<T> {
    Data(T),
    End,
}

/// Item type of the audio channel.
pub type AudioItem = StreamItem<AudioFrame>;

/// Item type of the transcript channel.
pub type TranscriptItem = StreamItem<String>;

/// Audio channel receiver, shareable across successive orchestrator runs so
/// a respawned session can pick up unconsumed frames.
pub type SharedAudioRx = Arc<Mutex<mpsc::Receiver<AudioItem>>>;

/// Cooperative shutdown signal shared by the pacer, the session loops, and
/// the collector. Clearing is idempotent and one-way: there is no way to
/// re-set the flag within a session.
#[derive(Debug, Clone)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Request an early stop. All loops check this at their channel
    /// operations and exit on their next pass.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_flag_clear_is_monotonic() {
        let flag = RunningFlag::new();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
    }

    #[test]
    fn stream_item_end_is_distinct_from_empty_data() {
        let empty = TranscriptItem::Data(String::new());
        assert_ne!(empty, TranscriptItem::End);
    }
}
