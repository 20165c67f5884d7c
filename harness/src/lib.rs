//! Integration harness for a chat service with optional synthesized audio.
//!
//! Drives `/api/chat` or `/api/chat/stream` with a list of prompts, checks
//! any WAV audio the replies reference, plays it locally, and scores the run.

pub mod cases;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod result;
pub mod runner;
pub mod store;
pub mod validation;
pub mod verifier;

pub use config::{ChatMode, HarnessConfig};
pub use error::HarnessError;
pub use result::{AudioResult, ChatResult, RunSummary, TextUpdate};
pub use runner::Harness;
