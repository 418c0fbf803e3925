pub mod audio;
pub mod bench;
pub mod config;
pub mod diff;
pub mod error;
pub mod provider;
pub mod session;

pub use audio::{stream_wav_file, AudioFile, AudioFrame};
pub use bench::{
    build_provider_specs, discover_assets, run_benchmark, AssetPair, BenchmarkResult, ProviderSpec,
};
pub use config::{AudioFormat, BenchConfig, Config, StreamConfig};
pub use diff::{normalize_text, DiffReport, MetricResult, SemanticScorer};
pub use error::{Result, SttError};
pub use provider::{
    DeepgramConfig, DeepgramProvider, MockProvider, ProviderSession, TranscriptEvent,
};
pub use session::{
    collect_transcripts, run_session, transcribe_and_diff, transcribe_wav_realtime, RunningFlag,
    SharedAudioRx, StreamItem,
};
