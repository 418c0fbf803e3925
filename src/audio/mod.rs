pub mod file;
pub mod pacer;

pub use file::AudioFile;
pub use pacer::stream_wav_file;

use crate::config::AudioFormat;
use std::time::Duration;

/// One chunk of raw PCM audio (16-bit signed little-endian, interleaved).
/// Immutable once produced; consumed exactly once by the session's sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub pcm: Vec<u8>,
}

impl AudioFrame {
    pub fn new(pcm: Vec<u8>) -> Self {
        Self { pcm }
    }

    /// A frame of pure silence with the given duration.
    pub fn silence(format: &AudioFormat, duration: Duration) -> Self {
        let samples = (format.sample_rate as f64 * duration.as_secs_f64()) as usize;
        let bytes = samples * format.sample_width_bytes as usize * format.channels as usize;
        Self { pcm: vec![0u8; bytes] }
    }

    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_frame_has_expected_size() {
        let format = AudioFormat::default();
        let frame = AudioFrame::silence(&format, Duration::from_millis(200));
        // 16000 Hz * 0.2 s * 2 bytes * 1 channel
        assert_eq!(frame.len(), 6400);
        assert!(frame.pcm.iter().all(|&b| b == 0));
    }
}
