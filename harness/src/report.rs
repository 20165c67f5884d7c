//! JSON snapshots of run summaries.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::error::HarnessError;
use crate::result::RunSummary;

pub const RESULTS_FILE_PREFIX: &str = "test_results_";

/// `test_results_<YYYYmmdd_HHMMSS>[_<n>].json`
pub fn snapshot_file_name(at: DateTime<Local>, attempt: u32) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    if attempt == 0 {
        format!("{RESULTS_FILE_PREFIX}{stamp}.json")
    } else {
        format!("{RESULTS_FILE_PREFIX}{stamp}_{attempt}.json")
    }
}

/// Write `summary` into `dir` under a fresh timestamped name. Existing
/// snapshots are never overwritten: a numeric suffix is added when the
/// name for this second is taken.
pub fn save_summary(summary: &RunSummary, dir: &Path) -> Result<PathBuf, HarnessError> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(summary)?;
    let now = Local::now();

    let mut attempt = 0;
    loop {
        let path = dir.join(snapshot_file_name(now, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(json.as_bytes())?;
                file.flush()?;
                info!("Test results saved to: {}", path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

pub fn load_summary(path: &Path) -> Result<RunSummary, HarnessError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Log the end-of-run block.
pub fn log_summary(summary: &RunSummary) {
    info!("Test Summary:");
    info!("Total Tests: {}", summary.total_tests);
    info!("Successful: {}", summary.successful_tests);
    info!("Failed: {}", summary.failed_tests);
    info!("Success Rate: {:.2}%", summary.success_rate);

    if summary.latency.count > 0 {
        info!(
            "Latency: avg {:.0} ms, p50 {} ms, p95 {} ms, max {} ms",
            summary.latency.avg_ms,
            summary.latency.p50_ms,
            summary.latency.p95_ms,
            summary.latency.max_ms
        );
    }
    if summary.audio.checked > 0 {
        info!(
            "Audio: {}/{} verified, {} ms of audio",
            summary.audio.passed, summary.audio.checked, summary.audio.total_audio_ms
        );
    }

    for case in summary.test_cases.iter().filter(|c| !c.success) {
        error!(
            "✗ {}: {}",
            case.test_name,
            case.error.as_deref().unwrap_or("failed")
        );
    }
}
