//! Scripted in-memory provider for tests and `--mock` dry runs.

use crate::error::{Result, SttError};
use crate::provider::{ProviderSession, TranscriptEvent};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

type EventTx = mpsc::UnboundedSender<Result<TranscriptEvent>>;
type EventRx = mpsc::UnboundedReceiver<Result<TranscriptEvent>>;

struct MockState {
    opened: bool,
    frames_received: usize,
    failed: bool,
    /// Error returned from open(), if configured
    open_error: Option<SttError>,
    /// After this many frames the session emits `fail_error` and dies
    fail_after_frames: Option<usize>,
    fail_error: Option<SttError>,
    /// Events flushed just ahead of the scripted failure
    events_before_failure: Vec<TranscriptEvent>,
    /// After this many frames send_audio() returns `send_error` while the
    /// event stream ends cleanly
    send_error_after_frames: Option<usize>,
    send_error: Option<SttError>,
    /// Events flushed when end_audio() arrives (clean close)
    events_on_end: Vec<TranscriptEvent>,
    /// Dropping this closes the event stream
    events_tx: Option<EventTx>,
}

impl MockState {
    fn emit(&self, item: Result<TranscriptEvent>) {
        if let Some(tx) = self.events_tx.as_ref() {
            let _ = tx.send(item);
        }
    }
}

/// A provider whose behavior is scripted up front: it either completes
/// cleanly after `end_audio()` (flushing configured events) or fails after
/// receiving a configured number of frames.
pub struct MockProvider {
    name: String,
    state: Mutex<MockState>,
    events_rx: AsyncMutex<Option<EventRx>>,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            name: name.to_string(),
            state: Mutex::new(MockState {
                opened: false,
                frames_received: 0,
                failed: false,
                open_error: None,
                fail_after_frames: None,
                fail_error: None,
                events_before_failure: Vec::new(),
                send_error_after_frames: None,
                send_error: None,
                events_on_end: Vec::new(),
                events_tx: Some(events_tx),
            }),
            events_rx: AsyncMutex::new(Some(events_rx)),
        }
    }

    /// Flush these events after `end_audio()`, then close cleanly.
    pub fn with_events_on_end(self, events: Vec<TranscriptEvent>) -> Self {
        self.state.lock().unwrap().events_on_end = events;
        self
    }

    /// Emit `error` and terminate the event stream once `frames` frames
    /// have been received.
    pub fn with_failure_after_frames(self, frames: usize, error: SttError) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.fail_after_frames = Some(frames);
            state.fail_error = Some(error);
        }
        self
    }

    /// Flush these events right before the scripted failure fires, so a
    /// dying session can still commit work it finished earlier.
    pub fn with_events_before_failure(self, events: Vec<TranscriptEvent>) -> Self {
        self.state.lock().unwrap().events_before_failure = events;
        self
    }

    /// Return `error` from send_audio() on frame number `frames` and end
    /// the event stream cleanly, without an Err item.
    pub fn with_send_error_after_frames(self, frames: usize, error: SttError) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.send_error_after_frames = Some(frames);
            state.send_error = Some(error);
        }
        self
    }

    /// Reject open() with `error`.
    pub fn with_open_error(self, error: SttError) -> Self {
        self.state.lock().unwrap().open_error = Some(error);
        self
    }

    /// Frames this session actually consumed.
    pub fn frames_received(&self) -> usize {
        self.state.lock().unwrap().frames_received
    }

    pub fn has_failed(&self) -> bool {
        self.state.lock().unwrap().failed
    }
}

#[async_trait]
impl ProviderSession for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.open_error.take() {
            return Err(err);
        }
        state.opened = true;
        Ok(())
    }

    async fn send_audio(&self, _pcm: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failed {
            // Dead session: sends drain as no-ops during shutdown races.
            return Ok(());
        }
        state.frames_received += 1;

        if let Some(limit) = state.send_error_after_frames {
            if state.frames_received >= limit {
                state.failed = true;
                // The transport rejects the frame but the read side sees a
                // clean end.
                state.events_tx = None;
                let err = state.send_error.take().unwrap_or(SttError::Disconnected {
                    message: "mock send failure".to_string(),
                });
                return Err(err);
            }
        }

        if let Some(limit) = state.fail_after_frames {
            if state.frames_received >= limit {
                state.failed = true;
                let events = std::mem::take(&mut state.events_before_failure);
                for ev in events {
                    state.emit(Ok(ev));
                }
                let err = state.fail_error.take().unwrap_or(SttError::Disconnected {
                    message: "mock failure".to_string(),
                });
                state.emit(Err(err));
                // Dropping the sender ends the event stream after the Err.
                state.events_tx = None;
            }
        }
        Ok(())
    }

    async fn end_audio(&self) {
        let mut state = self.state.lock().unwrap();
        if state.failed {
            return;
        }
        let events = std::mem::take(&mut state.events_on_end);
        for ev in events {
            state.emit(Ok(ev));
        }
        state.events_tx = None;
    }

    fn events(&self) -> BoxStream<'_, Result<TranscriptEvent>> {
        let rx = self
            .events_rx
            .try_lock()
            .ok()
            .and_then(|mut guard| guard.take());

        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            match rx.as_mut() {
                Some(receiver) => receiver.recv().await.map(|item| (item, rx)),
                None => None,
            }
        }))
    }

    async fn close(&self) {
        // Nothing to tear down; idempotent by construction.
    }
}
