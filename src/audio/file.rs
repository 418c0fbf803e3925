use crate::audio::AudioFrame;
use crate::config::AudioFormat;
use crate::error::{Result, SttError};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use tracing::{debug, info};

/// A fully-loaded benchmark audio asset.
///
/// Opening validates the WAV format against the configured expectations
/// before any streaming starts; a mismatch names the asset and the
/// offending field.
#[derive(Debug)]
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>, expected: &AudioFormat) -> Result<Self> {
        let path = path.as_ref();
        let asset = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Opening audio asset: {}", path.display());

        let reader = WavReader::open(path).map_err(|source| SttError::WavRead {
            asset: asset.clone(),
            source,
        })?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int {
            return Err(SttError::FormatMismatch {
                asset,
                field: "sample_format",
                actual: "float".to_string(),
                expected: "16-bit integer PCM".to_string(),
            });
        }
        if spec.sample_rate != expected.sample_rate {
            return Err(SttError::FormatMismatch {
                asset,
                field: "sample_rate",
                actual: spec.sample_rate.to_string(),
                expected: expected.sample_rate.to_string(),
            });
        }
        if spec.channels != expected.channels {
            return Err(SttError::FormatMismatch {
                asset,
                field: "channels",
                actual: spec.channels.to_string(),
                expected: expected.channels.to_string(),
            });
        }
        let expected_bits = expected.sample_width_bytes * 8;
        if spec.bits_per_sample != expected_bits {
            return Err(SttError::FormatMismatch {
                asset,
                field: "bits_per_sample",
                actual: spec.bits_per_sample.to_string(),
                expected: expected_bits.to_string(),
            });
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|source| SttError::WavRead {
                asset: asset.clone(),
                source,
            })?;

        let duration_seconds =
            samples.len() as f64 / (expected.sample_rate as f64 * expected.channels as f64);

        info!(
            "Audio asset loaded: {} ({:.1}s, {} samples)",
            asset,
            duration_seconds,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            samples,
        })
    }

    /// Split the audio into fixed-duration PCM frames. The final frame may
    /// be shorter than the chunk duration.
    pub fn frames(&self, chunk_ms: u64, format: &AudioFormat) -> Vec<AudioFrame> {
        let samples_per_chunk = (format.sample_rate as u64 * chunk_ms / 1000) as usize
            * format.channels as usize;

        self.samples
            .chunks(samples_per_chunk.max(1))
            .map(|chunk| {
                let pcm: Vec<u8> = chunk.iter().flat_map(|s| s.to_le_bytes()).collect();
                AudioFrame::new(pcm)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::tempdir;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn open_valid_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok.wav");
        write_wav(&path, 16000, 1, &vec![100i16; 16000]);

        let file = AudioFile::open(&path, &AudioFormat::default()).unwrap();
        assert!((file.duration_seconds - 1.0).abs() < 0.001);
    }

    #[test]
    fn open_rejects_wrong_sample_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fast.wav");
        write_wav(&path, 44100, 1, &vec![0i16; 100]);

        let err = AudioFile::open(&path, &AudioFormat::default()).unwrap_err();
        match err {
            SttError::FormatMismatch { field, actual, .. } => {
                assert_eq!(field, "sample_rate");
                assert_eq!(actual, "44100");
            }
            other => panic!("expected FormatMismatch, got {other:?}"),
        }
    }

    #[test]
    fn open_rejects_stereo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 16000, 2, &vec![0i16; 200]);

        let err = AudioFile::open(&path, &AudioFormat::default()).unwrap_err();
        match err {
            SttError::FormatMismatch { field, asset, .. } => {
                assert_eq!(field, "channels");
                assert_eq!(asset, "stereo.wav");
            }
            other => panic!("expected FormatMismatch, got {other:?}"),
        }
    }

    #[test]
    fn frames_cover_all_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunks.wav");
        // 1.1 s of audio at 16 kHz: 5 full 200 ms frames plus a 100 ms tail
        write_wav(&path, 16000, 1, &vec![7i16; 17600]);

        let file = AudioFile::open(&path, &AudioFormat::default()).unwrap();
        let frames = file.frames(200, &AudioFormat::default());
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[0].len(), 6400);
        assert_eq!(frames[5].len(), 3200);

        let total: usize = frames.iter().map(|f| f.len()).sum();
        assert_eq!(total, 17600 * 2);
    }
}
