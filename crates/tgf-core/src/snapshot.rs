//! File-backed `ChatPlatform`.
//!
//! Dialogs come from a JSON array of [`RawDialog`]; folder updates are upserted
//! by id into a JSON array of [`FolderAllocation`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::FolderAllocation,
    errors::Error,
    ports::{ChatPlatform, RawDialog},
    Result,
};

pub struct SnapshotPlatform {
    dialogs_path: PathBuf,
    folders_path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotPlatform {
    pub fn new(dialogs_path: impl Into<PathBuf>, folders_path: impl Into<PathBuf>) -> Self {
        Self {
            dialogs_path: dialogs_path.into(),
            folders_path: folders_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn folders_path(&self) -> &Path {
        &self.folders_path
    }

    async fn read_folders(&self) -> Result<Vec<FolderAllocation>> {
        match tokio::fs::read_to_string(&self.folders_path).await {
            Ok(txt) if txt.trim().is_empty() => Ok(Vec::new()),
            Ok(txt) => Ok(serde_json::from_str(&txt)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ChatPlatform for SnapshotPlatform {
    async fn fetch_dialogs(&self) -> Result<Vec<RawDialog>> {
        let txt = tokio::fs::read_to_string(&self.dialogs_path)
            .await
            .map_err(|e| {
                Error::Transport(format!(
                    "cannot read dialog snapshot {}: {e}",
                    self.dialogs_path.display()
                ))
            })?;
        serde_json::from_str(&txt).map_err(|e| {
            Error::Transport(format!(
                "malformed dialog snapshot {}: {e}",
                self.dialogs_path.display()
            ))
        })
    }

    async fn update_folder(&self, folder: &FolderAllocation) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut folders = self
            .read_folders()
            .await
            .map_err(|e| Error::Platform(e.to_string()))?;

        match folders.iter_mut().find(|f| f.folder_id == folder.folder_id) {
            Some(existing) => *existing = folder.clone(),
            None => folders.push(folder.clone()),
        }

        let pretty = serde_json::to_string_pretty(&folders)?;
        tokio::fs::write(&self.folders_path, pretty)
            .await
            .map_err(|e| Error::Platform(format!("cannot write folders: {e}")))
    }

    async fn existing_folders(&self) -> Result<Vec<FolderAllocation>> {
        self.read_folders().await
    }
}
