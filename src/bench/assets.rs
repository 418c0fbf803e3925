//! Benchmark asset discovery: WAV files paired with ground-truth TXT files.

use crate::error::{Result, SttError};
use std::path::{Path, PathBuf};

/// One benchmark asset: the audio and its expected transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    pub wav: PathBuf,
    pub txt: PathBuf,
}

impl AssetPair {
    /// File stem used in report names and summary rows.
    pub fn stem(&self) -> String {
        self.wav
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn collect_wavs(dir: &Path, wavs: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_wavs(&path, wavs)?;
        } else if path.extension().is_some_and(|ext| ext == "wav") {
            wavs.push(path);
        }
    }
    Ok(())
}

/// Scan `assets_dir` recursively for `*.wav` files and pair each with its
/// `*.txt` sibling. A WAV without a matching transcript is a hard error:
/// a benchmark against unknown ground truth measures nothing.
pub fn discover_assets(assets_dir: &Path) -> Result<Vec<AssetPair>> {
    if !assets_dir.is_dir() {
        return Err(SttError::Other(format!(
            "assets directory does not exist: {}",
            assets_dir.display()
        )));
    }

    let mut wavs = Vec::new();
    collect_wavs(assets_dir, &mut wavs)?;
    wavs.sort();

    let mut pairs = Vec::with_capacity(wavs.len());
    for wav in wavs {
        let txt = wav.with_extension("txt");
        if !txt.is_file() {
            return Err(SttError::Other(format!(
                "missing ground truth transcript for {}: {}",
                wav.display(),
                txt.display()
            )));
        }
        pairs.push(AssetPair { wav, txt });
    }
    Ok(pairs)
}
