//! Common utilities for integration tests: an in-process mock of the chat
//! service and a playback backend that records instead of playing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use audio_core::{encode_wav, AudioPlayer};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use harness::{ChatMode, HarnessConfig};
use serde_json::Value;
use tokio::net::TcpListener;

/// Valid 16-bit PCM mono WAV, 0.1 s at 16 kHz
pub fn sample_wav() -> Vec<u8> {
    let samples: Vec<f32> = (0..1600).map(|i| ((i as f32) * 0.07).sin() * 0.3).collect();
    encode_wav(&samples, 16000).unwrap()
}

/// SSE body from `data:` payloads
pub fn sse_body(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {p}\n\n"))
        .collect()
}

#[derive(Clone)]
struct MockState {
    chat: (StatusCode, String),
    stream: (StatusCode, String),
    audio: Arc<HashMap<String, (StatusCode, Vec<u8>)>>,
    inputs: Arc<Mutex<Vec<Value>>>,
    audio_requests: Arc<Mutex<Vec<String>>>,
}

/// Builder for a mock chat service
pub struct MockChatService {
    chat: (StatusCode, String),
    stream: (StatusCode, String),
    audio: HashMap<String, (StatusCode, Vec<u8>)>,
}

impl Default for MockChatService {
    fn default() -> Self {
        Self {
            chat: (StatusCode::OK, r#"{"response":"ok"}"#.to_string()),
            stream: (StatusCode::OK, sse_body(&[r#"{"type":"done"}"#])),
            audio: HashMap::new(),
        }
    }
}

impl MockChatService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_reply(mut self, status: StatusCode, body: &str) -> Self {
        self.chat = (status, body.to_string());
        self
    }

    pub fn stream_reply(mut self, status: StatusCode, body: String) -> Self {
        self.stream = (status, body);
        self
    }

    pub fn stream_events(self, payloads: &[&str]) -> Self {
        self.stream_reply(StatusCode::OK, sse_body(payloads))
    }

    pub fn audio(mut self, path: &str, status: StatusCode, bytes: Vec<u8>) -> Self {
        self.audio.insert(path.to_string(), (status, bytes));
        self
    }

    /// Bind to an ephemeral port and serve in the background.
    pub async fn spawn(self) -> RunningService {
        let state = MockState {
            chat: self.chat,
            stream: self.stream,
            audio: Arc::new(self.audio),
            inputs: Arc::new(Mutex::new(Vec::new())),
            audio_requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/api/chat", post(chat_endpoint))
            .route("/api/chat/stream", post(chat_stream_endpoint))
            .fallback(audio_endpoint)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        RunningService {
            base_url: format!("http://{addr}"),
            inputs: state.inputs,
            audio_requests: state.audio_requests,
        }
    }
}

pub struct RunningService {
    pub base_url: String,
    inputs: Arc<Mutex<Vec<Value>>>,
    audio_requests: Arc<Mutex<Vec<String>>>,
}

impl RunningService {
    /// Request bodies received by either chat endpoint, in order
    pub fn inputs(&self) -> Vec<Value> {
        self.inputs.lock().unwrap().clone()
    }

    /// Paths requested outside the chat endpoints
    pub fn audio_requests(&self) -> Vec<String> {
        self.audio_requests.lock().unwrap().clone()
    }
}

async fn chat_endpoint(State(s): State<MockState>, Json(req): Json<Value>) -> Response {
    s.inputs.lock().unwrap().push(req);
    let (status, body) = s.chat;
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn chat_stream_endpoint(State(s): State<MockState>, Json(req): Json<Value>) -> Response {
    s.inputs.lock().unwrap().push(req);
    let (status, body) = s.stream;
    (status, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn audio_endpoint(State(s): State<MockState>, uri: Uri) -> Response {
    s.audio_requests.lock().unwrap().push(uri.path().to_string());
    match s.audio.get(uri.path()) {
        Some((status, bytes)) => {
            (*status, [(header::CONTENT_TYPE, "audio/wav")], bytes.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Playback backend that records the files it was asked to play
#[derive(Clone, Default)]
pub struct RecordingPlayer {
    played: Arc<Mutex<Vec<PathBuf>>>,
    fail: bool,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player whose every playback fails, like a host without a sound card
    pub fn failing() -> Self {
        Self {
            played: Arc::default(),
            fail: true,
        }
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioPlayer for RecordingPlayer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn play(&self, path: &Path) -> anyhow::Result<()> {
        self.played.lock().unwrap().push(path.to_path_buf());
        if self.fail {
            anyhow::bail!("no audio device available");
        }
        Ok(())
    }
}

/// Harness config pointed at `base_url` with no pause between cases
pub fn test_config(base_url: &str, mode: ChatMode) -> HarnessConfig {
    HarnessConfig {
        base_url: base_url.to_string(),
        mode,
        delay_between_tests_ms: 0,
        ..HarnessConfig::default()
    }
}
