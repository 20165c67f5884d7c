pub mod sse;

use std::time::Duration;

use reqwest::{header, Client};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use sse::{sse_frames, FrameStream, SseDecoder, SseFrame, StreamEvent};

/// Non-streaming chat endpoint
pub const CHAT_PATH: &str = "/api/chat";
/// Server-Sent Events chat endpoint
pub const CHAT_STREAM_PATH: &str = "/api/chat/stream";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Request body shared by both chat endpoints
#[derive(Serialize)]
struct ChatRequest<'a> {
    input: &'a str,
}

/// Buffered reply from `/api/chat`
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub status: u16,
    pub body: String,
}

impl ChatReply {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Open reply from `/api/chat/stream`. The body is consumed either as
/// frames or, on an error status, as text.
#[derive(Debug)]
pub struct StreamResponse {
    status: u16,
    response: reqwest::Response,
}

impl StreamResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn frames(self) -> FrameStream {
        sse_frames(self.response.bytes_stream())
    }

    pub async fn text(self) -> Result<String, ChatError> {
        Ok(self.response.text().await?)
    }
}

/// Raw bytes fetched from an audio URL
#[derive(Debug, Clone)]
pub struct AudioDownload {
    pub status: u16,
    pub bytes: Vec<u8>,
}

/// HTTP client for the chat service under test.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    client: Client,
}

impl ChatClient {
    /// Create a client without request timeouts.
    pub fn new(base_url: &str) -> Result<Self, ChatError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client; `timeout` bounds each whole request when set.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ChatError::InvalidUrl(format!(
                "{base_url} (expected an http:// or https:// URL)"
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.to_string(),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a service path such as [`CHAT_PATH`].
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve an audio reference from a chat reply. Absolute URLs pass
    /// through; anything else is taken relative to the base URL.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            self.endpoint(url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// `POST /api/chat` and buffer the reply.
    pub async fn chat(&self, input: &str) -> Result<ChatReply, ChatError> {
        let url = self.endpoint(CHAT_PATH);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { input })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ChatReply { status, body })
    }

    /// `POST /api/chat/stream`; returns once response headers arrive.
    pub async fn chat_stream(&self, input: &str) -> Result<StreamResponse, ChatError> {
        let url = self.endpoint(CHAT_STREAM_PATH);
        debug!("POST {url} (event stream)");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "text/event-stream")
            .json(&ChatRequest { input })
            .send()
            .await?;

        Ok(StreamResponse {
            status: response.status().as_u16(),
            response,
        })
    }

    /// `GET` an audio reference, resolved against the base URL.
    pub async fn download(&self, audio_url: &str) -> Result<AudioDownload, ChatError> {
        let url = self.resolve(audio_url);
        debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?.to_vec();
        Ok(AudioDownload { status, bytes })
    }
}
