use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::TempDir;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Local-time stamp that prefixes audio kept in a persistent directory
const RUN_TAG_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where downloaded audio is written during a run.
///
/// The scoped variant owns a temporary directory that is removed when the
/// store is dropped, whichever way the run ends. The persistent variant
/// outlives the run, so its file names carry a per-run tag and existing
/// files are never replaced.
#[derive(Debug)]
pub enum AudioStore {
    Scoped(TempDir),
    Persistent { dir: PathBuf, run_tag: String },
}

impl AudioStore {
    pub fn scoped() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("chat-harness-").tempdir()?;
        debug!("Audio store: temporary directory {}", dir.path().display());
        Ok(AudioStore::Scoped(dir))
    }

    pub fn persistent(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let run_tag = Local::now().format(RUN_TAG_FORMAT).to_string();
        Self::persistent_with_tag(dir, run_tag)
    }

    pub fn persistent_with_tag(
        dir: impl Into<PathBuf>,
        run_tag: impl Into<String>,
    ) -> io::Result<Self> {
        let dir = dir.into();
        let run_tag = run_tag.into();
        std::fs::create_dir_all(&dir)?;
        info!("Audio store: keeping files in {} (run {run_tag})", dir.display());
        Ok(AudioStore::Persistent { dir, run_tag })
    }

    /// Persistent when `output_dir` is set, scoped otherwise.
    pub fn open(output_dir: Option<&Path>) -> io::Result<Self> {
        match output_dir {
            Some(dir) => Self::persistent(dir),
            None => Self::scoped(),
        }
    }

    pub fn dir(&self) -> &Path {
        match self {
            AudioStore::Scoped(dir) => dir.path(),
            AudioStore::Persistent { dir, .. } => dir,
        }
    }

    pub fn is_scoped(&self) -> bool {
        matches!(self, AudioStore::Scoped(_))
    }

    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let (dir, run_tag) = match self {
            AudioStore::Scoped(dir) => {
                let path = dir.path().join(file_name);
                tokio::fs::write(&path, bytes).await?;
                return Ok(path);
            }
            AudioStore::Persistent { dir, run_tag } => (dir, run_tag),
        };

        let mut attempt = 0;
        loop {
            let path = dir.join(tagged_file_name(run_tag, attempt, file_name));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Release the store, reporting cleanup errors that a plain drop would
    /// swallow. Persistent directories are left in place.
    pub fn close(self) -> io::Result<()> {
        match self {
            AudioStore::Scoped(dir) => dir.close(),
            AudioStore::Persistent { .. } => Ok(()),
        }
    }
}

/// File name for the `seq`-th audio file of a test case (1-based)
pub fn audio_file_name(test_name: &str, seq: usize) -> String {
    let safe: String = test_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("{safe}_audio_{seq:02}.wav")
}

/// `<run_tag>[_<n>]_<file_name>`
fn tagged_file_name(run_tag: &str, attempt: u32, file_name: &str) -> String {
    if attempt == 0 {
        format!("{run_tag}_{file_name}")
    } else {
        format!("{run_tag}_{attempt}_{file_name}")
    }
}
