// Timing and audio statistics for a run summary

use serde::{Deserialize, Serialize};

use crate::result::ChatResult;

/// Request latency over all test cases of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub min_ms: u64,
    pub max_ms: u64,
    pub avg_ms: f64,
    pub p50_ms: u64,
    pub p95_ms: u64,
}

impl LatencyStats {
    pub fn from_results(results: &[ChatResult]) -> Self {
        let samples: Vec<u64> = results.iter().map(ChatResult::duration_ms).collect();
        Self::from_samples(&samples)
    }

    pub fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let total: u64 = sorted.iter().sum();

        Self {
            count: sorted.len(),
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
            avg_ms: total as f64 / sorted.len() as f64,
            p50_ms: percentile(&sorted, 50),
            p95_ms: percentile(&sorted, 95),
        }
    }
}

// `sorted` must be non-empty and ascending
fn percentile(sorted: &[u64], p: u8) -> u64 {
    let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
    sorted[index]
}

/// Audio checks over all test cases of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioStats {
    pub checked: usize,
    pub passed: usize,
    pub total_bytes: u64,
    pub total_audio_ms: u64,
}

impl AudioStats {
    pub fn from_results(results: &[ChatResult]) -> Self {
        let mut stats = Self::default();
        for audio in results.iter().flat_map(|r| r.audio_results.iter()) {
            stats.checked += 1;
            if audio.success {
                stats.passed += 1;
            }
            if let Some(details) = &audio.audio_details {
                stats.total_bytes += details.file_size;
                stats.total_audio_ms += details.duration_ms();
            }
        }
        stats
    }
}
