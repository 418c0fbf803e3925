//! Session-layer integration tests: pacer, orchestrator, and collector
//! wired over real channels with the scripted mock provider.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use stt_bench::provider::{MockProvider, ProviderSession, TranscriptEvent};
use stt_bench::session::{
    collect_transcripts, run_session, transcribe_wav_realtime, RunningFlag, SharedAudioRx,
    StreamItem, TranscriptItem,
};
use stt_bench::{AudioFrame, Config, SttError};
use tempfile::tempdir;
use tokio::sync::{mpsc, Mutex};

fn write_wav(path: &Path, samples: &[i16]) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn fast_config() -> Config {
    let mut cfg = Config::default();
    cfg.stream.realtime_factor = 0.0;
    cfg.stream.silence_padding_secs = 0.2;
    cfg
}

fn frame() -> AudioFrame {
    AudioFrame {
        pcm: vec![0u8; 64],
    }
}

#[tokio::test]
async fn clean_session_ends_with_terminator_and_full_transcript() {
    let dir = tempdir().unwrap();
    let wav = dir.path().join("greeting.wav");
    write_wav(&wav, &vec![100i16; 8000]);

    let provider = Arc::new(MockProvider::new("mock").with_events_on_end(vec![
        TranscriptEvent::partial("dobrý"),
        TranscriptEvent::committed("dobrý den"),
        TranscriptEvent::committed("  "),
        TranscriptEvent::committed("světe"),
    ]));

    let transcript = transcribe_wav_realtime(provider.clone(), &wav, &fast_config())
        .await
        .unwrap();

    // Partials and blank finals are dropped; the rest joins in order.
    assert_eq!(transcript, "dobrý den světe");
    assert!(provider.frames_received() > 0);
}

#[tokio::test]
async fn failed_session_propagates_the_provider_error() {
    let dir = tempdir().unwrap();
    let wav = dir.path().join("dies.wav");
    write_wav(&wav, &vec![1i16; 16000]);

    let provider = Arc::new(MockProvider::new("mock").with_failure_after_frames(
        2,
        SttError::Disconnected {
            message: "socket reset".to_string(),
        },
    ));

    let err = transcribe_wav_realtime(provider, &wav, &fast_config())
        .await
        .unwrap_err();
    // The session error wins over any pacer backpressure symptom.
    assert!(matches!(err, SttError::Disconnected { .. }), "got {err}");
}

#[tokio::test]
async fn session_failure_leaves_channels_open_for_a_respawn() {
    let (audio_tx, audio_rx) = mpsc::channel(16);
    let audio_rx: SharedAudioRx = Arc::new(Mutex::new(audio_rx));
    let (transcript_tx, transcript_rx) = mpsc::channel(16);
    let running = RunningFlag::new();

    // First session commits one segment, then dies on the first frame.
    audio_tx.send(StreamItem::Data(frame())).await.unwrap();
    let failing = Arc::new(
        MockProvider::new("first")
            .with_failure_after_frames(
                1,
                SttError::Disconnected {
                    message: "gone".to_string(),
                },
            )
            .with_events_before_failure(vec![TranscriptEvent::committed("první část")]),
    );
    let err = run_session(
        failing,
        Arc::clone(&audio_rx),
        transcript_tx.clone(),
        running.clone(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SttError::Disconnected { .. }));

    // Second session picks up the same channels and finishes cleanly.
    audio_tx.send(StreamItem::Data(frame())).await.unwrap();
    audio_tx.send(StreamItem::End).await.unwrap();
    let replacement = Arc::new(
        MockProvider::new("second")
            .with_events_on_end(vec![TranscriptEvent::committed("pokračujeme")]),
    );
    run_session(
        Arc::clone(&replacement) as Arc<dyn ProviderSession>,
        audio_rx,
        transcript_tx,
        running.clone(),
    )
    .await
    .unwrap();
    assert_eq!(replacement.frames_received(), 1);

    // Both sessions' segments survive the handover in arrival order. Had
    // the failed session sealed the channel, the collector would have
    // stopped before "pokračujeme".
    let segments = collect_transcripts(running, transcript_rx).await;
    assert_eq!(
        segments,
        vec!["první část".to_string(), "pokračujeme".to_string()]
    );
}

#[tokio::test]
async fn failed_session_does_not_seal_the_transcript_channel() {
    let (audio_tx, audio_rx) = mpsc::channel(16);
    let audio_rx: SharedAudioRx = Arc::new(Mutex::new(audio_rx));
    let (transcript_tx, mut transcript_rx) = mpsc::channel(16);

    audio_tx.send(StreamItem::Data(frame())).await.unwrap();
    let provider = Arc::new(
        MockProvider::new("mock")
            .with_failure_after_frames(
                1,
                SttError::Disconnected {
                    message: "gone".to_string(),
                },
            )
            .with_events_before_failure(vec![TranscriptEvent::committed("půlka věty")]),
    );
    run_session(provider, audio_rx, transcript_tx, RunningFlag::new())
        .await
        .unwrap_err();

    // The committed segment is queued but no terminator follows it.
    match transcript_rx.try_recv() {
        Ok(TranscriptItem::Data(text)) => assert_eq!(text, "půlka věty"),
        other => panic!("expected the committed segment, got {other:?}"),
    }
    assert!(transcript_rx.try_recv().is_err());
}

#[tokio::test]
async fn send_failure_with_clean_event_stream_fails_the_session() {
    let (audio_tx, audio_rx) = mpsc::channel(16);
    let audio_rx: SharedAudioRx = Arc::new(Mutex::new(audio_rx));
    let (transcript_tx, mut transcript_rx) = mpsc::channel(16);

    audio_tx.send(StreamItem::Data(frame())).await.unwrap();
    audio_tx.send(StreamItem::End).await.unwrap();

    // The transport rejects the frame while the read side ends without an
    // error; the send error must still fail the session.
    let provider = Arc::new(MockProvider::new("mock").with_send_error_after_frames(
        1,
        SttError::Disconnected {
            message: "broken pipe".to_string(),
        },
    ));
    let err = run_session(provider, audio_rx, transcript_tx, RunningFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SttError::Disconnected { .. }), "got {err}");

    // Error path: no terminator, the channels stay usable for a respawn.
    assert!(transcript_rx.try_recv().is_err());
}

#[tokio::test]
async fn open_failure_closes_the_provider_and_returns_the_error() {
    let (_audio_tx, audio_rx) = mpsc::channel::<stt_bench::session::AudioItem>(4);
    let audio_rx: SharedAudioRx = Arc::new(Mutex::new(audio_rx));
    let (transcript_tx, mut transcript_rx) = mpsc::channel(4);

    let provider = Arc::new(MockProvider::new("mock").with_open_error(SttError::Auth {
        message: "bad key".to_string(),
    }));

    let err = run_session(provider, audio_rx, transcript_tx, RunningFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SttError::Auth { .. }));
    assert!(transcript_rx.try_recv().is_err());
}

#[tokio::test]
async fn sender_drains_remaining_frames_after_session_death() {
    let (audio_tx, audio_rx) = mpsc::channel(16);
    let audio_rx: SharedAudioRx = Arc::new(Mutex::new(audio_rx));
    let (transcript_tx, _transcript_rx) = mpsc::channel(16);

    for _ in 0..5 {
        audio_tx.send(StreamItem::Data(frame())).await.unwrap();
    }
    audio_tx.send(StreamItem::End).await.unwrap();

    // Dies on the first frame; the remaining frames must drain as no-ops
    // without a second error.
    let provider = Arc::new(MockProvider::new("mock").with_failure_after_frames(
        1,
        SttError::Disconnected {
            message: "gone".to_string(),
        },
    ));
    let err = run_session(
        Arc::clone(&provider) as Arc<dyn ProviderSession>,
        audio_rx,
        transcript_tx,
        RunningFlag::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SttError::Disconnected { .. }));
    assert_eq!(provider.frames_received(), 1);
}

#[tokio::test]
async fn cleared_flag_stops_the_collector_without_a_terminator() {
    let (transcript_tx, transcript_rx) = mpsc::channel(4);
    let running = RunningFlag::new();

    let collector = tokio::spawn(collect_transcripts(running.clone(), transcript_rx));
    transcript_tx
        .send(TranscriptItem::Data("jedna".to_string()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    running.clear();
    // Wake the collector; it takes this item and then sees the cleared flag.
    transcript_tx
        .send(TranscriptItem::Data("dvě".to_string()))
        .await
        .unwrap();

    // Must finish despite never receiving a terminator.
    let segments = tokio::time::timeout(Duration::from_secs(2), collector)
        .await
        .expect("collector must stop on a cleared flag")
        .unwrap();
    assert_eq!(segments, vec!["jedna".to_string(), "dvě".to_string()]);
}
