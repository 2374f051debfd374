// File-backed configuration blob storage
use crate::application::config_store::ConfigStorage;
use anyhow::Context;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Storage key for the configuration blob; the version suffix bumps when the
/// stored shape changes incompatibly, abandoning older blobs.
pub const CONFIG_SCHEMA_KEY: &str = "growth_config_v2";

#[derive(Debug, Clone)]
pub struct FileConfigStorage {
    path: PathBuf,
}

impl FileConfigStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let mut path = dir.into();
        path.push(format!("{CONFIG_SCHEMA_KEY}.json"));
        Self { path }
    }
}

impl ConfigStorage for FileConfigStorage {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Some(blob),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "failed to read config blob: {err}");
                None
            }
        }
    }

    fn save(&self, blob: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, blob)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
