// Configuration for a harness run

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Directory used when audio should outlive the run
pub const DEFAULT_OUTPUT_DIR: &str = "test_outputs";

/// Which chat endpoint a run exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// `POST /api/chat`, one JSON reply
    Chat,
    /// `POST /api/chat/stream`, Server-Sent Events
    Stream,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Chat => "chat",
            ChatMode::Stream => "stream",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" | "sync" => Ok(ChatMode::Chat),
            "stream" | "sse" => Ok(ChatMode::Stream),
            other => Err(format!("unknown chat mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub base_url: String,
    pub mode: ChatMode,
    /// Persistent audio directory; `None` means a temporary directory
    /// removed when the run ends.
    pub output_dir: Option<PathBuf>,
    pub results_dir: PathBuf,
    pub delay_between_tests_ms: u64,
    pub request_timeout_secs: Option<u64>,
    pub playback: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            mode: ChatMode::Stream,
            output_dir: None,
            results_dir: PathBuf::from("."),
            delay_between_tests_ms: 1000,
            request_timeout_secs: None,
            playback: true,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("HARNESS_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);

        let mode = lookup("HARNESS_MODE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.mode);

        let output_dir = lookup("HARNESS_OUTPUT_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let results_dir = lookup("HARNESS_RESULTS_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.results_dir);

        let delay_between_tests_ms = lookup("HARNESS_DELAY_MS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.delay_between_tests_ms);

        let request_timeout_secs = lookup("HARNESS_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .filter(|secs: &u64| *secs > 0);

        let playback = lookup("HARNESS_PLAYBACK")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.playback);

        Self {
            base_url,
            mode,
            output_dir,
            results_dir,
            delay_between_tests_ms,
            request_timeout_secs,
            playback,
        }
    }

    pub fn delay_between_tests(&self) -> Duration {
        Duration::from_millis(self.delay_between_tests_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = HarnessConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.mode, ChatMode::Stream);
        assert_eq!(config.output_dir, None);
        assert_eq!(config.results_dir, PathBuf::from("."));
        assert_eq!(config.delay_between_tests(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), None);
        assert!(config.playback);
    }

    #[test]
    fn test_values_from_environment() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("HARNESS_BASE_URL", " http://chat.internal:9000 "),
            ("HARNESS_MODE", "chat"),
            ("HARNESS_OUTPUT_DIR", "test_outputs"),
            ("HARNESS_RESULTS_DIR", "results"),
            ("HARNESS_DELAY_MS", "250"),
            ("HARNESS_REQUEST_TIMEOUT_SECS", "30"),
            ("HARNESS_PLAYBACK", "off"),
        ]));

        assert_eq!(config.base_url, "http://chat.internal:9000");
        assert_eq!(config.mode, ChatMode::Chat);
        assert_eq!(config.output_dir, Some(PathBuf::from("test_outputs")));
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.delay_between_tests(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(!config.playback);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("HARNESS_MODE", "websocket"),
            ("HARNESS_DELAY_MS", "soon"),
            ("HARNESS_REQUEST_TIMEOUT_SECS", "0"),
            ("HARNESS_PLAYBACK", "maybe"),
            ("HARNESS_BASE_URL", "   "),
        ]));

        assert_eq!(config.mode, ChatMode::Stream);
        assert_eq!(config.delay_between_tests_ms, 1000);
        assert_eq!(config.request_timeout_secs, None);
        assert!(config.playback);
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_chat_mode_parsing() {
        assert_eq!("STREAM".parse::<ChatMode>(), Ok(ChatMode::Stream));
        assert_eq!("sse".parse::<ChatMode>(), Ok(ChatMode::Stream));
        assert_eq!("chat".parse::<ChatMode>(), Ok(ChatMode::Chat));
        assert!("ws".parse::<ChatMode>().is_err());
        assert_eq!(ChatMode::Stream.to_string(), "stream");
    }
}
