//! Provider contract: the uniform session lifecycle every STT vendor
//! adapter implements.
//!
//! A session goes through construction (no I/O), [`ProviderSession::open`]
//! (connect + handshake), streaming (concurrent `send_audio` calls and
//! `events()` iteration), and [`ProviderSession::close`]. The session core
//! in [`crate::session`] never inspects vendor-specific message shapes;
//! everything vendor-shaped lives behind this trait.

pub mod deepgram;
pub mod mock;

pub use deepgram::{DeepgramConfig, DeepgramProvider};
pub use mock::MockProvider;

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A single transcript event from a provider. Partial results carry
/// `is_final = false` and are discarded by the session core; only committed
/// segments flow downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn committed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// One real-time STT session with a vendor.
///
/// Implementations use interior mutability: the session core drives
/// `send_audio` and `events()` from two concurrent tasks over a shared
/// reference.
#[async_trait]
pub trait ProviderSession: Send + Sync {
    /// Short vendor name for logs and reports.
    fn name(&self) -> &str;

    /// Establish the connection and complete the vendor handshake. No audio
    /// or transcript data moves before this succeeds.
    async fn open(&self) -> Result<()>;

    /// Forward one PCM frame. After the session has died this must be a
    /// no-op rather than an error, so in-flight sends can drain during
    /// shutdown races.
    async fn send_audio(&self, pcm: &[u8]) -> Result<()>;

    /// Signal that no more audio will be sent. Best-effort: transport
    /// errors are swallowed here because this call typically races the
    /// vendor's own closing handshake.
    async fn end_audio(&self);

    /// The transcript event stream. Ends when the provider closes the
    /// connection; error termination yields a final `Err` item carrying the
    /// concrete failure, distinct from a clean end.
    fn events(&self) -> BoxStream<'_, Result<TranscriptEvent>>;

    /// Tear down the connection and any background receive task. Idempotent.
    async fn close(&self);
}
