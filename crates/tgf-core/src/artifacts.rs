use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{errors::Error, Result};

/// Scratch storage for intermediate documents of one run (debugging aid only).
pub trait ArtifactStore: Send + Sync {
    fn write_value(&self, name: &str, value: &serde_json::Value) -> Result<()>;
    fn write_text(&self, name: &str, text: &str) -> Result<()>;
    fn cleanup(&self) -> Result<()>;
}

/// Serialize and store; failures are logged and swallowed.
pub fn record<T: Serialize + ?Sized>(store: &dyn ArtifactStore, name: &str, value: &T) {
    let res = serde_json::to_value(value)
        .map_err(Error::from)
        .and_then(|v| store.write_value(name, &v));
    if let Err(e) = res {
        warn!(artifact = name, error = %e, "failed to write artifact");
    }
}

pub fn record_text(store: &dyn ArtifactStore, name: &str, text: &str) {
    if let Err(e) = store.write_text(name, text) {
        warn!(artifact = name, error = %e, "failed to write artifact");
    }
}

/// Writes pretty-printed JSON files into a per-run directory.
#[derive(Clone, Debug)]
pub struct DirArtifactStore {
    dir: PathBuf,
    keep: bool,
}

impl DirArtifactStore {
    /// `root/run-<timestamp>`; the directory is created lazily on first write.
    pub fn for_run(root: &Path, keep: bool) -> Self {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3f");
        Self {
            dir: root.join(format!("run-{stamp}")),
            keep,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        Ok(self.dir.join(name))
    }
}

impl ArtifactStore for DirArtifactStore {
    fn write_value(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        let pretty = serde_json::to_string_pretty(value)?;
        fs::write(self.path_for(name)?, pretty)?;
        Ok(())
    }

    fn write_text(&self, name: &str, text: &str) -> Result<()> {
        fs::write(self.path_for(name)?, text)?;
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        if self.keep {
            debug!(dir = %self.dir.display(), "keeping run artifacts");
            return Ok(());
        }
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopArtifactStore;

impl ArtifactStore for NoopArtifactStore {
    fn write_value(&self, _name: &str, _value: &serde_json::Value) -> Result<()> {
        Ok(())
    }

    fn write_text(&self, _name: &str, _text: &str) -> Result<()> {
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}
