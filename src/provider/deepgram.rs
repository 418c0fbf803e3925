//! Deepgram Live Audio adapter: raw PCM over WebSocket, JSON results back.
//!
//! Audio goes out as binary frames. `Finalize` flushes pending results and
//! `CloseStream` ends the stream server-side. Only `Results` messages with
//! `is_final: true` become transcript events; interim results and metadata
//! are dropped at this layer.

use crate::config::AudioFormat;
use crate::error::{Result, SttError};
use crate::provider::{ProviderSession, TranscriptEvent};
use async_trait::async_trait;
use futures::stream::{BoxStream, SplitSink};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type EventRx = mpsc::Receiver<Result<TranscriptEvent>>;

const EVENT_QUEUE_DEPTH: usize = 200;

#[derive(Debug, Clone)]
pub struct DeepgramConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// BCP-47 tag, e.g. "cs"
    pub language: String,
    pub punctuate: bool,
    pub smart_format: bool,
    pub interim_results: bool,
    /// Raw PCM needs an explicit encoding in the query string
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Server-side endpointing window in milliseconds
    pub endpointing_ms: u64,
}

impl DeepgramConfig {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>, format: &AudioFormat) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "wss://api.deepgram.com/v1/listen".to_string(),
            model: "nova-2".to_string(),
            language: language.into(),
            punctuate: true,
            smart_format: true,
            interim_results: true,
            encoding: "linear16".to_string(),
            sample_rate: format.sample_rate,
            channels: format.channels,
            endpointing_ms: 1000,
        }
    }

    fn url(&self) -> String {
        let params = [
            ("model", self.model.clone()),
            ("language", self.language.clone()),
            ("encoding", self.encoding.clone()),
            ("sample_rate", self.sample_rate.to_string()),
            ("channels", self.channels.to_string()),
            ("punctuate", self.punctuate.to_string()),
            ("smart_format", self.smart_format.to_string()),
            ("interim_results", self.interim_results.to_string()),
            ("endpointing", self.endpointing_ms.to_string()),
        ];
        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.base_url)
    }
}

/// One Deepgram streaming session.
pub struct DeepgramProvider {
    config: DeepgramConfig,
    sink: AsyncMutex<Option<WsSink>>,
    events_rx: AsyncMutex<Option<EventRx>>,
    rx_task: Mutex<Option<JoinHandle<()>>>,
}

impl DeepgramProvider {
    pub fn new(config: DeepgramConfig) -> Self {
        Self {
            config,
            sink: AsyncMutex::new(None),
            events_rx: AsyncMutex::new(None),
            rx_task: Mutex::new(None),
        }
    }
}

fn classify_handshake_error(err: WsError) -> SttError {
    match err {
        WsError::Http(response) => {
            let status = response.status();
            let message = format!("handshake rejected with {status}");
            if status.as_u16() == 401 || status.as_u16() == 403 {
                SttError::Auth { message }
            } else if status.as_u16() == 429 {
                SttError::Quota { message }
            } else {
                SttError::Connection { message }
            }
        }
        other => SttError::Connection {
            message: other.to_string(),
        },
    }
}

/// Extract the final transcript from a `Results` payload, if it carries one.
fn final_transcript(data: &Value) -> Option<String> {
    if !data["is_final"].as_bool().unwrap_or(false) {
        return None;
    }
    let text = data["channel"]["alternatives"][0]["transcript"]
        .as_str()?
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}

async fn recv_loop(
    mut read: futures::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    events_tx: mpsc::Sender<Result<TranscriptEvent>>,
) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let data: Value = match serde_json::from_str(text.as_str()) {
                    Ok(data) => data,
                    Err(err) => {
                        let _ = events_tx
                            .send(Err(SttError::Protocol {
                                message: format!("unparseable message: {err}"),
                            }))
                            .await;
                        return;
                    }
                };

                let message_type = data["type"].as_str().unwrap_or("");
                if message_type == "Error" || data.get("error").is_some() {
                    let _ = events_tx
                        .send(Err(SttError::Protocol {
                            message: data.to_string(),
                        }))
                        .await;
                    return;
                }

                match message_type {
                    "Results" => {
                        if let Some(text) = final_transcript(&data) {
                            if events_tx
                                .send(Ok(TranscriptEvent::committed(text)))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        } else {
                            debug!("interim or empty result dropped");
                        }
                    }
                    // Useful when debugging; nothing downstream needs them.
                    "Metadata" | "UtteranceEnd" | "SpeechStarted" => {}
                    other => debug!(message_type = other, "unhandled message type"),
                }
            }
            Ok(Message::Close(frame)) => {
                // Only Normal (1000) and Away (1001) are clean ends; any
                // other close code is an abnormal shutdown the session
                // must report, not swallow.
                match frame {
                    Some(f) if !matches!(u16::from(f.code), 1000 | 1001) => {
                        let _ = events_tx
                            .send(Err(SttError::Disconnected {
                                message: format!(
                                    "server closed with code {}: {}",
                                    u16::from(f.code),
                                    f.reason
                                ),
                            }))
                            .await;
                    }
                    _ => info!(?frame, "server closed the stream"),
                }
                return;
            }
            // Deepgram sends JSON text; ignore unexpected binary and pings.
            Ok(_) => {}
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => return,
            Err(err) => {
                let _ = events_tx
                    .send(Err(SttError::Disconnected {
                        message: err.to_string(),
                    }))
                    .await;
                return;
            }
        }
    }
}

#[async_trait]
impl ProviderSession for DeepgramProvider {
    fn name(&self) -> &str {
        "deepgram"
    }

    async fn open(&self) -> Result<()> {
        let mut request = self
            .config
            .url()
            .into_client_request()
            .map_err(|err| SttError::Connection {
                message: err.to_string(),
            })?;
        let auth = HeaderValue::from_str(&format!("Token {}", self.config.api_key)).map_err(
            |_| SttError::Auth {
                message: "API key is not a valid header value".to_string(),
            },
        )?;
        request.headers_mut().insert("Authorization", auth);

        let (ws, _response) = connect_async(request)
            .await
            .map_err(classify_handshake_error)?;
        info!(model = %self.config.model, language = %self.config.language, "connected");

        let (write, read) = ws.split();
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        *self.sink.lock().await = Some(write);
        *self.events_rx.lock().await = Some(events_rx);
        *self.rx_task.lock().unwrap() = Some(tokio::spawn(recv_loop(read, events_tx)));
        Ok(())
    }

    async fn send_audio(&self, pcm: &[u8]) -> Result<()> {
        let mut sink = self.sink.lock().await;
        let Some(write) = sink.as_mut() else {
            // Session already torn down; drain silently.
            return Ok(());
        };
        if let Err(err) = write.send(Message::Binary(pcm.to_vec().into())).await {
            sink.take();
            return Err(SttError::Disconnected {
                message: err.to_string(),
            });
        }
        Ok(())
    }

    async fn end_audio(&self) {
        let mut sink = self.sink.lock().await;
        if let Some(write) = sink.as_mut() {
            for payload in ["Finalize", "CloseStream"] {
                let message = json!({ "type": payload }).to_string();
                if let Err(err) = write.send(Message::text(message)).await {
                    debug!(error = %err, "close message lost in flight");
                    break;
                }
            }
        }
    }

    fn events(&self) -> BoxStream<'_, Result<TranscriptEvent>> {
        let rx = self
            .events_rx
            .try_lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if rx.is_none() {
            warn!("events() called twice or before open()");
        }

        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            match rx.as_mut() {
                Some(receiver) => receiver.recv().await.map(|item| (item, rx)),
                None => None,
            }
        }))
    }

    async fn close(&self) {
        if let Some(mut write) = self.sink.lock().await.take() {
            let _ = write.close().await;
        }
        if let Some(task) = self.rx_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_audio_and_model_params() {
        let config = DeepgramConfig::new("key", "cs", &AudioFormat::default());
        let url = config.url();
        assert!(url.starts_with("wss://api.deepgram.com/v1/listen?"));
        assert!(url.contains("model=nova-2"));
        assert!(url.contains("language=cs"));
        assert!(url.contains("encoding=linear16"));
        assert!(url.contains("sample_rate=16000"));
        assert!(url.contains("channels=1"));
        assert!(url.contains("interim_results=true"));
    }

    #[test]
    fn final_results_extracted_interims_dropped() {
        let final_msg = json!({
            "type": "Results",
            "is_final": true,
            "channel": { "alternatives": [ { "transcript": " dobrý den " } ] }
        });
        assert_eq!(final_transcript(&final_msg), Some("dobrý den".to_string()));

        let interim = json!({
            "type": "Results",
            "is_final": false,
            "channel": { "alternatives": [ { "transcript": "dobrý" } ] }
        });
        assert_eq!(final_transcript(&interim), None);

        let empty = json!({
            "type": "Results",
            "is_final": true,
            "channel": { "alternatives": [ { "transcript": "   " } ] }
        });
        assert_eq!(final_transcript(&empty), None);
    }

    #[tokio::test]
    async fn abnormal_server_close_surfaces_as_disconnect() {
        use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
        use tokio_tungstenite::tungstenite::protocol::CloseFrame;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Close(Some(CloseFrame {
                code: CloseCode::Error,
                reason: "internal server error".into(),
            })))
            .await
            .unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let mut config = DeepgramConfig::new("key", "cs", &AudioFormat::default());
        config.base_url = format!("ws://{addr}/v1/listen");
        let provider = DeepgramProvider::new(config);
        provider.open().await.unwrap();

        let events: Vec<_> = provider.events().collect().await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            Err(SttError::Disconnected { message }) => {
                assert!(message.contains("1011"), "{message}");
            }
            other => panic!("expected a disconnect error, got {other:?}"),
        }
        provider.close().await;
    }

    #[tokio::test]
    async fn normal_server_close_ends_the_stream_cleanly() {
        use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
        use tokio_tungstenite::tungstenite::protocol::CloseFrame;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "done".into(),
            })))
            .await
            .unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let mut config = DeepgramConfig::new("key", "cs", &AudioFormat::default());
        config.base_url = format!("ws://{addr}/v1/listen");
        let provider = DeepgramProvider::new(config);
        provider.open().await.unwrap();

        let events: Vec<_> = provider.events().collect().await;
        assert!(events.is_empty(), "clean close should not emit events: {events:?}");
        provider.close().await;
    }
}
