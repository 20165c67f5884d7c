//! Sequential test driver.
//!
//! One prompt at a time: send the request, interpret the reply, verify any
//! audio it references, record the result, pause, move on.

use audio_core::AudioPlayer;
use chat_core::{ChatClient, SseFrame, StreamEvent};
use futures_util::StreamExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{ChatMode, HarnessConfig};
use crate::error::HarnessError;
use crate::report::log_summary;
use crate::result::{ChatResult, PendingResult, ResultAggregator, RunSummary, TextUpdate};
use crate::store::{audio_file_name, AudioStore};
use crate::validation::{validate_base_url, validate_prompt};
use crate::verifier::AudioVerifier;

/// Reply fields that count as "text received" for `/api/chat`
const TEXT_FIELDS: [&str; 3] = ["response", "reply", "text"];

pub struct Harness {
    config: HarnessConfig,
    client: ChatClient,
    store: AudioStore,
    player: Box<dyn AudioPlayer>,
}

impl Harness {
    pub fn new(config: HarnessConfig, player: Box<dyn AudioPlayer>) -> Result<Self, HarnessError> {
        validate_base_url(&config.base_url)?;
        let client = ChatClient::with_timeout(&config.base_url, config.request_timeout())?;
        let store = AudioStore::open(config.output_dir.as_deref())?;

        Ok(Self {
            config,
            client,
            store,
            player,
        })
    }

    pub fn store(&self) -> &AudioStore {
        &self.store
    }

    fn verifier(&self) -> AudioVerifier<'_> {
        AudioVerifier::new(&self.client, &self.store, self.player.as_ref())
    }

    /// Run every test case in order and summarize.
    pub async fn run_tests(&self, test_cases: &[String]) -> RunSummary {
        let mut aggregator = ResultAggregator::new();
        info!(
            "Run {}: {} test case(s) against {} ({} mode)",
            aggregator.run_id(),
            test_cases.len(),
            self.client.base_url(),
            self.config.mode
        );

        for (index, test_case) in test_cases.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.delay_between_tests()).await;
            }

            info!("Testing with input: {test_case}");
            let result = aggregator.record(self.run_case(index, test_case).await);

            if result.success {
                info!("✓ Test passed");
                if result.received_audio {
                    info!("✓ Audio verified");
                }
            } else {
                error!("✗ Test failed");
                if let Some(err) = &result.error {
                    error!("Error: {err}");
                }
            }
        }

        let summary = aggregator.into_summary();
        log_summary(&summary);
        summary
    }

    /// Run one prompt in the configured mode.
    pub async fn run_case(&self, index: usize, input: &str) -> ChatResult {
        let test_name = format!("{}_{:02}", self.config.mode, index + 1);
        match self.config.mode {
            ChatMode::Chat => self.test_chat(&test_name, input).await,
            ChatMode::Stream => self.test_chat_stream(&test_name, input).await,
        }
    }

    /// Exercise `POST /api/chat`.
    pub async fn test_chat(&self, test_name: &str, input: &str) -> ChatResult {
        let mut pending = PendingResult::start(test_name, input, ChatMode::Chat);
        let outcome = self.drive_chat(input, &mut pending).await;
        pending.finish(outcome)
    }

    /// Exercise `POST /api/chat/stream`.
    pub async fn test_chat_stream(&self, test_name: &str, input: &str) -> ChatResult {
        let mut pending = PendingResult::start(test_name, input, ChatMode::Stream);
        let outcome = self.drive_stream(input, &mut pending).await;
        pending.finish(outcome)
    }

    async fn drive_chat(&self, input: &str, pending: &mut PendingResult) -> Result<(), HarnessError> {
        validate_prompt(input)?;

        let reply = self.client.chat(input).await?;
        pending.set_status(reply.status);
        if !reply.is_success() {
            return Err(HarnessError::http_status(reply.status, &reply.body));
        }

        let body: Value = serde_json::from_str(&reply.body)
            .map_err(|e| HarnessError::Malformed(format!("chat reply is not JSON: {e}")))?;
        if !body.is_object() {
            return Err(HarnessError::Malformed(
                "chat reply is not a JSON object".to_string(),
            ));
        }

        let has_text = TEXT_FIELDS
            .iter()
            .any(|field| body.get(field).and_then(Value::as_str).is_some_and(|t| !t.is_empty()));
        let audio_url = body.get("audio_url").and_then(Value::as_str).map(str::to_string);
        let audio_base64 = body
            .get("audio_base64")
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!("Chat reply: {body}");
        pending.set_response(body, has_text);

        let verifier = self.verifier();
        if let Some(url) = audio_url {
            info!("Audio URL: {url}");
            let file_name = audio_file_name(pending.test_name(), pending.audio_count() + 1);
            pending.push_audio(verifier.verify_url(&url, &file_name).await);
        }
        if let Some(encoded) = audio_base64 {
            info!("Inline audio: {} Base64 characters", encoded.len());
            let file_name = audio_file_name(pending.test_name(), pending.audio_count() + 1);
            pending.push_audio(verifier.verify_inline(&encoded, &file_name).await);
        }
        Ok(())
    }

    async fn drive_stream(&self, input: &str, pending: &mut PendingResult) -> Result<(), HarnessError> {
        validate_prompt(input)?;

        let response = self.client.chat_stream(input).await?;
        pending.set_status(response.status());
        if !response.is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(HarnessError::http_status(status, &body));
        }

        let verifier = self.verifier();
        let mut frames = response.frames();
        while let Some(frame) = frames.next().await {
            match frame? {
                SseFrame::Event(StreamEvent::Update { text, audio_url }) => {
                    info!("Received text: {text}");
                    pending.push_update(TextUpdate {
                        text,
                        audio_url: audio_url.clone(),
                    });

                    if let Some(url) = audio_url {
                        info!("Audio URL: {url}");
                        let file_name =
                            audio_file_name(pending.test_name(), pending.audio_count() + 1);
                        pending.push_audio(verifier.verify_url(&url, &file_name).await);
                    }
                }
                SseFrame::Event(StreamEvent::Error { message }) => {
                    let err = HarnessError::server(message);
                    error!("Server error: {err}");
                    return Err(err);
                }
                SseFrame::Event(StreamEvent::Done) => {
                    info!("Stream completed");
                    return Ok(());
                }
                SseFrame::Unrecognized { kind, payload } => {
                    warn!("Ignoring event with unrecognized type `{kind}`: {payload}");
                }
                SseFrame::Malformed { payload, reason } => {
                    warn!("Failed to parse SSE data: {reason} ({payload})");
                }
            }
        }

        warn!("Stream closed without a done event");
        Ok(())
    }

    /// End the run, removing a temporary audio directory.
    pub fn finish(self) -> Result<(), HarnessError> {
        self.store.close()?;
        Ok(())
    }
}
