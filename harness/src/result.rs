//! Result model and scoring.
//!
//! A [`PendingResult`] collects what happens while one test case is in
//! flight; [`PendingResult::finish`] scores it into an immutable
//! [`ChatResult`]. The [`ResultAggregator`] owns the results of a run and
//! turns them into a [`RunSummary`].

use std::path::PathBuf;
use std::time::{Duration, Instant};

use audio_core::WavDetails;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ChatMode;
use crate::error::HarnessError;
use crate::metrics::{AudioStats, LatencyStats};

/// One `update` event from a chat stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUpdate {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Outcome of downloading and checking one audio reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioResult {
    pub audio_url: String,
    /// `None` for inline audio and for transport failures
    pub status_code: Option<u16>,
    pub duration_secs: f64,
    pub success: bool,
    pub audio_details: Option<WavDetails>,
    pub error: Option<String>,
    pub file_path: Option<PathBuf>,
}

impl AudioResult {
    pub fn passed(
        audio_url: &str,
        status_code: Option<u16>,
        elapsed: Duration,
        details: WavDetails,
        file_path: PathBuf,
    ) -> Self {
        Self {
            audio_url: audio_url.to_string(),
            status_code,
            duration_secs: elapsed.as_secs_f64(),
            success: true,
            audio_details: Some(details),
            error: None,
            file_path: Some(file_path),
        }
    }

    pub fn failed(
        audio_url: &str,
        status_code: Option<u16>,
        elapsed: Duration,
        error: &HarnessError,
    ) -> Self {
        Self {
            audio_url: audio_url.to_string(),
            status_code,
            duration_secs: elapsed.as_secs_f64(),
            success: false,
            audio_details: None,
            error: Some(error.to_string()),
            file_path: None,
        }
    }
}

/// Scored outcome of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub test_name: String,
    pub input: String,
    pub mode: ChatMode,
    pub status_code: Option<u16>,
    pub duration_secs: f64,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    pub received_text: bool,
    pub received_audio: bool,
    /// Parsed body of a non-streaming reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default)]
    pub updates: Vec<TextUpdate>,
    #[serde(default)]
    pub audio_results: Vec<AudioResult>,
}

impl ChatResult {
    pub fn duration_ms(&self) -> u64 {
        (self.duration_secs * 1000.0).round() as u64
    }
}

/// Test case in flight.
#[derive(Debug)]
pub struct PendingResult {
    test_name: String,
    input: String,
    mode: ChatMode,
    started: Instant,
    timestamp: DateTime<Utc>,
    status_code: Option<u16>,
    received_text: bool,
    response: Option<Value>,
    updates: Vec<TextUpdate>,
    audio_results: Vec<AudioResult>,
}

impl PendingResult {
    pub fn start(test_name: &str, input: &str, mode: ChatMode) -> Self {
        Self {
            test_name: test_name.to_string(),
            input: input.to_string(),
            mode,
            started: Instant::now(),
            timestamp: Utc::now(),
            status_code: None,
            received_text: false,
            response: None,
            updates: Vec::new(),
            audio_results: Vec::new(),
        }
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    pub fn set_status(&mut self, status: u16) {
        self.status_code = Some(status);
    }

    pub fn set_response(&mut self, response: Value, has_text: bool) {
        self.received_text |= has_text;
        self.response = Some(response);
    }

    pub fn push_update(&mut self, update: TextUpdate) {
        self.received_text = true;
        self.updates.push(update);
    }

    pub fn push_audio(&mut self, audio: AudioResult) {
        self.audio_results.push(audio);
    }

    pub fn audio_count(&self) -> usize {
        self.audio_results.len()
    }

    /// Score the case. `outcome` is the verdict of the request/stream
    /// itself; audio checks are folded in here.
    pub fn finish(self, outcome: Result<(), HarnessError>) -> ChatResult {
        let duration = self.started.elapsed();
        let failed_audio = self.audio_results.iter().find(|a| !a.success);

        let error = match (&outcome, failed_audio) {
            (Err(e), _) => Some(e.to_string()),
            (Ok(()), Some(audio)) => Some(format!(
                "Audio verification failed for {}: {}",
                audio.audio_url,
                audio.error.as_deref().unwrap_or("unknown error")
            )),
            (Ok(()), None) => None,
        };

        let success = is_successful(outcome.is_ok(), self.status_code, &self.audio_results);
        let received_audio = self.audio_results.iter().any(|a| a.success);

        ChatResult {
            test_name: self.test_name,
            input: self.input,
            mode: self.mode,
            status_code: self.status_code,
            duration_secs: duration.as_secs_f64(),
            timestamp: self.timestamp,
            success,
            error,
            received_text: self.received_text,
            received_audio,
            response: self.response,
            updates: self.updates,
            audio_results: self.audio_results,
        }
    }
}

/// A case passes when the request itself completed cleanly with status 200
/// and every audio reference it produced verified.
pub fn is_successful(request_ok: bool, status_code: Option<u16>, audio: &[AudioResult]) -> bool {
    request_ok && status_code == Some(200) && audio.iter().all(|a| a.success)
}

/// Success percentage in `[0, 100]`; `0` for an empty run.
pub fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (successful as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Aggregate of one run, persisted as a JSON snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub success_rate: f64,
    pub latency: LatencyStats,
    pub audio: AudioStats,
    pub test_cases: Vec<ChatResult>,
}

impl RunSummary {
    pub fn from_results(run_id: Uuid, started_at: DateTime<Utc>, results: Vec<ChatResult>) -> Self {
        let total_tests = results.len();
        let successful_tests = results.iter().filter(|r| r.success).count();

        Self {
            run_id,
            started_at,
            total_tests,
            successful_tests,
            failed_tests: total_tests - successful_tests,
            success_rate: success_rate(successful_tests, total_tests),
            latency: LatencyStats::from_results(&results),
            audio: AudioStats::from_results(&results),
            test_cases: results,
        }
    }

    /// True only for a non-empty run with no failures.
    pub fn all_passed(&self) -> bool {
        self.total_tests > 0 && self.failed_tests == 0
    }
}

/// Accumulates the results of one run in execution order.
#[derive(Debug)]
pub struct ResultAggregator {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    results: Vec<ChatResult>,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record(&mut self, result: ChatResult) -> &ChatResult {
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    pub fn summarize(&self) -> RunSummary {
        RunSummary::from_results(self.run_id, self.started_at, self.results.clone())
    }

    pub fn into_summary(self) -> RunSummary {
        RunSummary::from_results(self.run_id, self.started_at, self.results)
    }
}
