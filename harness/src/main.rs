use std::path::PathBuf;
use std::process::ExitCode;

use audio_core::{system_player, AudioPlayer, SilentPlayer};
use clap::Parser;
use tracing::{error, info};

use harness::cases::{default_test_cases, load_test_cases};
use harness::config::{ChatMode, HarnessConfig, DEFAULT_OUTPUT_DIR};
use harness::report::save_summary;
use harness::Harness;

/// Manual integration test for the chat service's text and audio replies.
#[derive(Debug, Parser)]
#[command(name = "chat-harness", version)]
struct Cli {
    /// Service base URL [env: HARNESS_BASE_URL]
    #[arg(long)]
    base_url: Option<String>,

    /// Endpoint to exercise [env: HARNESS_MODE]
    #[arg(long, value_enum)]
    mode: Option<ChatMode>,

    /// Keep downloaded audio in this directory [env: HARNESS_OUTPUT_DIR]
    #[arg(long, conflicts_with = "keep_audio")]
    output_dir: Option<PathBuf>,

    /// Keep downloaded audio in ./test_outputs
    #[arg(long)]
    keep_audio: bool,

    /// Directory for test_results_*.json [env: HARNESS_RESULTS_DIR]
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Pause between test cases in milliseconds [env: HARNESS_DELAY_MS]
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout in seconds; none by default
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Verify audio without playing it
    #[arg(long)]
    no_playback: bool,

    /// Prompt to send (repeatable); replaces the built-in list
    #[arg(long = "prompt")]
    prompts: Vec<String>,

    /// File with one prompt per line
    #[arg(long, conflicts_with = "prompts")]
    prompts_file: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        } else if self.keep_audio {
            config.output_dir = Some(PathBuf::from(DEFAULT_OUTPUT_DIR));
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
        if let Some(ms) = self.delay_ms {
            config.delay_between_tests_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = Some(secs).filter(|s| *s > 0);
        }
        if self.no_playback {
            config.playback = false;
        }
        config
    }

    /// Prompts file, then `--prompt` flags, then the built-in list.
    fn test_cases(&self) -> anyhow::Result<Vec<String>> {
        if let Some(path) = &self.prompts_file {
            return Ok(load_test_cases(path)?);
        }
        if self.prompts.is_empty() {
            return Ok(default_test_cases());
        }
        Ok(self.prompts.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    match async_main(Cli::parse()).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("✗ Integration test run aborted: {e:#}");
            Err(e)
        }
    }
}

async fn async_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.apply(HarnessConfig::from_env());
    let test_cases = cli.test_cases()?;

    let player: Box<dyn AudioPlayer> = if config.playback {
        system_player()
    } else {
        Box::new(SilentPlayer::new("playback disabled"))
    };

    info!("Starting integration tests...");
    let harness = Harness::new(config.clone(), player)?;
    let summary = harness.run_tests(&test_cases).await;
    let saved = save_summary(&summary, &config.results_dir);
    harness.finish()?;
    saved?;

    if summary.all_passed() {
        info!("✓ All tests passed successfully!");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("✗ Some tests failed");
        Ok(ExitCode::FAILURE)
    }
}
