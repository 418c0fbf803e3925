//! Error taxonomy for the benchmark harness.
//!
//! Errors local to one (provider, asset) run never cross into sibling runs;
//! the benchmark driver converts them into per-result failure records.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SttError {
    /// An audio asset does not match the configured PCM format. Fatal for
    /// that asset, raised before any streaming starts.
    #[error("{asset}: {field}={actual}, expected {expected}")]
    FormatMismatch {
        asset: String,
        field: &'static str,
        actual: String,
        expected: String,
    },

    #[error("failed to read WAV {asset}: {source}")]
    WavRead {
        asset: String,
        #[source]
        source: hound::Error,
    },

    /// Handshake or transport failure while opening a provider session.
    #[error("connection failed: {message}")]
    Connection { message: String },

    #[error("authentication rejected: {message}")]
    Auth { message: String },

    #[error("quota or rate limit exceeded: {message}")]
    Quota { message: String },

    /// The provider sent an error payload or an unparseable message.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The provider dropped the connection before the session completed.
    #[error("provider disconnected unexpectedly: {message}")]
    Disconnected { message: String },

    /// The audio channel stayed full past the backpressure budget. A symptom
    /// error: when a session failure is in flight, the session failure is
    /// the one to report.
    #[error("audio channel full for longer than {budget:?}")]
    Backpressure { budget: Duration },

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SttError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mismatch_names_asset_and_field() {
        let err = SttError::FormatMismatch {
            asset: "greeting.wav".to_string(),
            field: "sample_rate",
            actual: "44100".to_string(),
            expected: "16000".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("greeting.wav"));
        assert!(msg.contains("sample_rate"));
        assert!(msg.contains("44100"));
        assert!(msg.contains("16000"));
    }

    #[test]
    fn backpressure_display_includes_budget() {
        let err = SttError::Backpressure {
            budget: Duration::from_secs(5),
        };
        assert!(err.to_string().contains("5s"));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<SttError>();
        assert_sync::<SttError>();
    }
}
