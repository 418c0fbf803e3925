use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioFormat,
    pub stream: StreamConfig,
    pub bench: BenchConfig,
}

/// Expected PCM format for every benchmark asset. Assets that deviate fail
/// eagerly with a format error naming the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AudioFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// 1 = mono
    pub channels: u16,
    /// 2 = 16-bit PCM
    pub sample_width_bytes: u16,
}

/// Pacing parameters for real-time audio delivery.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Duration of each audio chunk in milliseconds
    pub chunk_ms: u64,

    /// Playback speed multiplier: 1.0 = real time, 0.0 = no pacing delay
    pub realtime_factor: f64,

    /// Silence prepended and appended to the audio, in seconds. Gives the
    /// provider's VAD time to detect speech boundaries.
    pub silence_padding_secs: f64,

    /// Bound of the audio channel
    pub audio_queue_depth: usize,

    /// Bound of the transcript channel
    pub transcript_queue_depth: usize,

    /// How long a push onto a full audio channel may block before the pacer
    /// gives up with a backpressure error
    pub backpressure_budget_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Directory scanned recursively for WAV/TXT asset pairs
    pub assets_dir: String,

    /// Directory for TSV and HTML reports
    pub out_dir: String,

    /// Language hint passed to providers (ISO 639-1)
    pub language: String,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            sample_width_bytes: 2,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_ms: 200,
            realtime_factor: 1.0,
            silence_padding_secs: 2.0,
            audio_queue_depth: 40,
            transcript_queue_depth: 200,
            backpressure_budget_secs: 10,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            out_dir: "out".to_string(),
            language: "cs".to_string(),
        }
    }
}

impl StreamConfig {
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_millis(self.chunk_ms)
    }

    /// Sleep between chunk pushes: chunk duration scaled by the realtime
    /// factor. None when pacing is disabled.
    pub fn pacing_delay(&self) -> Option<Duration> {
        if self.realtime_factor > 0.0 {
            Some(Duration::from_secs_f64(
                self.chunk_ms as f64 / 1000.0 * self.realtime_factor,
            ))
        } else {
            None
        }
    }

    pub fn backpressure_budget(&self) -> Duration {
        Duration::from_secs(self.backpressure_budget_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// anything unset. A missing file is not an error; defaults apply.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_audio_format() {
        let cfg = Config::default();
        assert_eq!(cfg.audio.sample_rate, 16000);
        assert_eq!(cfg.audio.channels, 1);
        assert_eq!(cfg.audio.sample_width_bytes, 2);
        assert_eq!(cfg.stream.chunk_ms, 200);
    }

    #[test]
    fn pacing_delay_scales_with_realtime_factor() {
        let mut stream = StreamConfig::default();
        stream.realtime_factor = 0.5;
        assert_eq!(stream.pacing_delay(), Some(Duration::from_millis(100)));

        stream.realtime_factor = 0.0;
        assert_eq!(stream.pacing_delay(), None);
    }
}
