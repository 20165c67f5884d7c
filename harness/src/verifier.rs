use std::time::{Duration, Instant};

use audio_core::{decode_base64_audio, inspect_wav, AudioPlayer};
use chat_core::ChatClient;
use tracing::{error, info, warn};

use crate::error::HarnessError;
use crate::result::AudioResult;
use crate::store::AudioStore;
use crate::validation::validate_audio_url;

/// Label recorded as `audio_url` for audio embedded in a reply
pub const INLINE_AUDIO_LABEL: &str = "inline:audio_base64";

/// Downloads, validates and plays audio referenced by chat replies.
pub struct AudioVerifier<'a> {
    client: &'a ChatClient,
    store: &'a AudioStore,
    player: &'a dyn AudioPlayer,
}

impl<'a> AudioVerifier<'a> {
    pub fn new(client: &'a ChatClient, store: &'a AudioStore, player: &'a dyn AudioPlayer) -> Self {
        Self {
            client,
            store,
            player,
        }
    }

    /// Verify an audio URL. Never fails; problems are recorded in the
    /// returned result.
    pub async fn verify_url(&self, audio_url: &str, file_name: &str) -> AudioResult {
        let started = Instant::now();

        if let Err(e) = validate_audio_url(audio_url) {
            return self.failure(audio_url, None, started.elapsed(), e);
        }

        let download = match self.client.download(audio_url).await {
            Ok(download) => download,
            Err(e) => return self.failure(audio_url, None, started.elapsed(), e.into()),
        };

        if download.status != 200 {
            return self.failure(
                audio_url,
                Some(download.status),
                started.elapsed(),
                HarnessError::AudioDownload(download.status),
            );
        }

        self.check_and_play(audio_url, Some(download.status), &download.bytes, file_name, started)
            .await
    }

    /// Verify Base64 audio embedded in a reply.
    pub async fn verify_inline(&self, encoded: &str, file_name: &str) -> AudioResult {
        let started = Instant::now();
        match decode_base64_audio(encoded) {
            Ok(bytes) => {
                self.check_and_play(INLINE_AUDIO_LABEL, None, &bytes, file_name, started)
                    .await
            }
            Err(e) => self.failure(
                INLINE_AUDIO_LABEL,
                None,
                started.elapsed(),
                HarnessError::InvalidWav(e.to_string()),
            ),
        }
    }

    async fn check_and_play(
        &self,
        audio_url: &str,
        status_code: Option<u16>,
        bytes: &[u8],
        file_name: &str,
        started: Instant,
    ) -> AudioResult {
        let path = match self.store.write(file_name, bytes).await {
            Ok(path) => path,
            Err(e) => return self.failure(audio_url, status_code, started.elapsed(), e.into()),
        };

        let details = match inspect_wav(bytes) {
            Ok(details) => details,
            Err(e) => {
                return self.failure(
                    audio_url,
                    status_code,
                    started.elapsed(),
                    HarnessError::InvalidWav(e.to_string()),
                )
            }
        };
        // verdict is fixed before playback
        let elapsed = started.elapsed();

        info!(
            "Audio OK: {} channel(s), {}-byte samples, {} Hz, {} frames ({} bytes)",
            details.channels,
            details.sample_width,
            details.frame_rate,
            details.frame_count,
            details.file_size
        );

        info!("Playing audio response via {}...", self.player.name());
        if let Err(e) = self.player.play(&path).await {
            warn!("Audio playback failed: {e:#}");
        }

        AudioResult::passed(audio_url, status_code, elapsed, details, path)
    }

    fn failure(
        &self,
        audio_url: &str,
        status_code: Option<u16>,
        elapsed: Duration,
        err: HarnessError,
    ) -> AudioResult {
        error!("Audio check failed for {audio_url}: {err}");
        AudioResult::failed(audio_url, status_code, elapsed, &err)
    }
}
