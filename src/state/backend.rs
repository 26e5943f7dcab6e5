use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use super::document::StoreDocument;
use crate::error::{BotError, Result};

/// Read-all / write-all access to wherever the document lives
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn load(&self) -> Result<StoreDocument>;

    async fn save(&self, document: &StoreDocument) -> Result<()>;

    /// Where the document lives, for log lines
    fn describe(&self) -> String;
}

/// Single pretty-printed JSON file
pub struct JsonFileBackend {
    path: String,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn load(&self) -> Result<StoreDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(StoreDocument::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| BotError::StateParse {
                path: self.path.clone(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(BotError::StateLoad {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Write to `<path>.tmp` then rename over the target
    async fn save(&self, document: &StoreDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(document).map_err(|e| BotError::StateParse {
            path: self.path.clone(),
            source: e,
        })?;

        let temp_path = format!("{}.tmp", self.path);
        tokio::fs::write(&temp_path, &content)
            .await
            .map_err(|e| BotError::StateSave {
                path: self.path.clone(),
                source: e,
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| BotError::StateSave {
                path: self.path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

/// Keeps the document in process memory only
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    document: StoreDocument,
    saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last document handed to `save`
    pub fn document(&self) -> StoreDocument {
        self.inner.lock().document.clone()
    }

    /// Number of completed saves
    pub fn saves(&self) -> usize {
        self.inner.lock().saves
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<StoreDocument> {
        Ok(self.inner.lock().document.clone())
    }

    async fn save(&self, document: &StoreDocument) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.document = document.clone();
        inner.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{FlagState, OverwriteSettings, PermissionFlag};

    fn temp_path(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("overwrite-keeper-{}-{}-{}.json", name, std::process::id(), nanos))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let backend = JsonFileBackend::new(temp_path("missing"));
        let doc = backend.load().await.unwrap();
        assert!(doc.guilds.is_empty());
    }

    #[tokio::test]
    async fn test_file_save_replaces_whole_document() {
        let path = temp_path("save");
        let backend = JsonFileBackend::new(path.clone());

        let mut doc = StoreDocument::default();
        doc.guild_mut("1").roles.entry("2".to_string()).or_default().insert(
            "3".to_string(),
            OverwriteSettings::default().with(PermissionFlag::Speak, FlagState::Deny),
        );
        backend.save(&doc).await.unwrap();
        assert!(!std::path::Path::new(&format!("{}.tmp", path)).exists());
        assert_eq!(backend.load().await.unwrap(), doc);

        let empty = StoreDocument::default();
        backend.save(&empty).await.unwrap();
        assert_eq!(backend.load().await.unwrap(), empty);

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let backend = JsonFileBackend::new(path.clone());
        assert!(matches!(backend.load().await, Err(BotError::StateParse { .. })));
        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_memory_backend_counts_saves() {
        let backend = MemoryBackend::new();
        backend.save(&StoreDocument::default()).await.unwrap();
        backend.save(&StoreDocument::default()).await.unwrap();
        assert_eq!(backend.saves(), 2);
    }
}
