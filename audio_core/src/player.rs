//! Local audio playback.
//!
//! Playback is an optional side effect of verification: callers pick one
//! backend at startup with [`system_player`] and hand it a file path. The
//! concrete backends shell out to whatever player the host OS ships with.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Capability to play a WAV file to completion.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Play the file and return once playback has finished.
    async fn play(&self, path: &Path) -> anyhow::Result<()>;
}

/// Plays audio by running an external command with the file path as its
/// last argument.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// macOS
    pub fn afplay() -> Self {
        Self::new("afplay", Vec::new())
    }

    /// Linux (ALSA)
    pub fn aplay() -> Self {
        Self::new("aplay", vec!["-q".to_string()])
    }

    /// Windows: hand the file to the registered default application
    pub fn windows_start() -> Self {
        Self::new(
            "cmd",
            vec![
                "/C".to_string(),
                "start".to_string(),
                "/wait".to_string(),
                String::new(),
            ],
        )
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn play(&self, path: &Path) -> anyhow::Result<()> {
        debug!("Running {} {:?} {}", self.program, self.args, path.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start {}: {e}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

/// Backend that never plays anything. Used on unsupported platforms and
/// when playback is switched off.
#[derive(Debug, Clone)]
pub struct SilentPlayer {
    reason: String,
}

impl SilentPlayer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AudioPlayer for SilentPlayer {
    fn name(&self) -> &str {
        "silent"
    }

    async fn play(&self, path: &Path) -> anyhow::Result<()> {
        warn!("Skipping playback of {} ({})", path.display(), self.reason);
        Ok(())
    }
}

/// Select the playback backend for an OS name as reported by
/// `std::env::consts::OS`.
pub fn player_for_os(os: &str) -> Box<dyn AudioPlayer> {
    match os {
        "macos" => Box::new(CommandPlayer::afplay()),
        "linux" => Box::new(CommandPlayer::aplay()),
        "windows" => Box::new(CommandPlayer::windows_start()),
        other => Box::new(SilentPlayer::new(format!(
            "audio playback not supported on {other}"
        ))),
    }
}

/// Backend for the host this process runs on.
pub fn system_player() -> Box<dyn AudioPlayer> {
    player_for_os(std::env::consts::OS)
}
