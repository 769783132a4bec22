//! History file storage: one line per entry, appended as lines are
//! submitted.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hangle_core::{HistoryError, HistoryStore};
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

/// File name used under the home directory.
pub const HISTORY_FILE_NAME: &str = ".hangle_history";

/// Append-only history file.
pub struct FileHistory {
    path: PathBuf,
    file: Mutex<FileState>,
}

enum FileState {
    Unopened,
    Open(File),
    Closed,
}

impl FileHistory {
    /// History backed by `path`. The file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(FileState::Unopened),
        }
    }

    /// Default location, `~/.hangle_history`, if a home directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME))
    }

    /// Path of the history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for FileHistory {
    async fn load(&self) -> Result<Vec<String>, HistoryError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn append(&self, line: &str) -> Result<(), HistoryError> {
        let mut state = self.file.lock().await;
        if matches!(*state, FileState::Unopened) {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            *state = FileState::Open(file);
        }
        let FileState::Open(file) = &mut *state else {
            return Err(HistoryError::Closed);
        };
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), HistoryError> {
        let mut state = self.file.lock().await;
        if let FileState::Open(file) = std::mem::replace(&mut *state, FileState::Closed) {
            file.sync_all().await?;
        }
        Ok(())
    }
}
