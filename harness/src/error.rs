use chat_core::ChatError;
use thiserror::Error;

/// Longest slice of an error body kept in a result
const MAX_BODY_EXCERPT: usize = 200;

/// Failure of a single test case or audio check.
///
/// None of these abort a run; they end up as the `error` string of the
/// result they belong to.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Request failed with status {status}{detail}")]
    HttpStatus { status: u16, detail: String },

    /// Reported by the service through an `error` event
    #[error("{0}")]
    Server(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Failed to download audio: {0}")]
    AudioDownload(u16),

    #[error("Invalid WAV data: {0}")]
    InvalidWav(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Non-200 reply, keeping a short excerpt of the body.
    pub fn http_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let detail = if body.is_empty() {
            String::new()
        } else {
            let excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
            format!(": {excerpt}")
        };
        HarnessError::HttpStatus { status, detail }
    }

    /// Message from an `error` event; an empty message still fails the case.
    pub fn server(message: String) -> Self {
        if message.trim().is_empty() {
            HarnessError::Server("server reported an error without a message".to_string())
        } else {
            HarnessError::Server(message)
        }
    }
}
