//! Template persistence. Templates are opaque text blobs keyed by name.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

const TEMPLATE_EXTENSION: &str = "tex";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid template name '{0}': use letters, digits, '-' or '_'")]
    InvalidName(String),

    #[error("template storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Named template storage.
///
/// `save` replaces the whole body at once; a concurrent `load` sees either the
/// old body or the new one. Concurrent saves to one name: last writer wins.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// `Ok(None)` means the template has never been saved.
    async fn load(&self, name: &str) -> Result<Option<Template>, StoreError>;

    async fn save(&self, name: &str, body: &str) -> Result<Template, StoreError>;
}

/// Names map straight onto file names, so only a conservative alphabet is accepted.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filesystem store
// ────────────────────────────────────────────────────────────────────────────

/// One `<name>.tex` file per template under a single directory.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    dir: PathBuf,
}

impl FsTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn load(&self, name: &str) -> Result<Option<Template>, StoreError> {
        validate_name(name)?;
        let path = self.path_for(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => {
                debug!("Loaded template '{name}' from {}", path.display());
                Ok(Some(Template {
                    name: name.to_string(),
                    body,
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, name: &str, body: &str) -> Result<Template, StoreError> {
        validate_name(name)?;
        let dir = self.dir.clone();
        let path = self.path_for(name);
        let contents = body.to_string();

        // temp file in the target directory → fsync → rename over the target
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(contents.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;

        info!(
            "Saved template '{name}' ({} bytes) to {}",
            body.len(),
            self.dir.display()
        );
        Ok(Template {
            name: name.to_string(),
            body: body.to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store
// ────────────────────────────────────────────────────────────────────────────

/// Process-local store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<String, String>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn load(&self, name: &str) -> Result<Option<Template>, StoreError> {
        validate_name(name)?;
        Ok(self.templates.read().await.get(name).map(|body| Template {
            name: name.to_string(),
            body: body.clone(),
        }))
    }

    async fn save(&self, name: &str, body: &str) -> Result<Template, StoreError> {
        validate_name(name)?;
        self.templates
            .write()
            .await
            .insert(name.to_string(), body.to_string());
        Ok(Template {
            name: name.to_string(),
            body: body.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("resume").is_ok());
        assert!(validate_name("cover_letter-v2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name(&"x".repeat(65)).is_err());
    }

    #[tokio::test]
    async fn test_fs_load_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path());
        assert!(store.load("resume").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path().join("nested"));
        let body = "\\documentclass{article}\n\\begin{document}Hi\\end{document}\n";

        let saved = store.save("resume", body).await.unwrap();
        assert_eq!(saved.body, body);

        let loaded = store.load("resume").await.unwrap().unwrap();
        assert_eq!(loaded.name, "resume");
        assert_eq!(loaded.body, body);
        assert!(dir.path().join("nested/resume.tex").exists());
    }

    #[tokio::test]
    async fn test_fs_save_overwrites_wholesale() {
        let dir = tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path());
        store.save("resume", "a much longer first version").await.unwrap();
        store.save("resume", "short").await.unwrap();
        assert_eq!(store.load("resume").await.unwrap().unwrap().body, "short");
    }

    #[tokio::test]
    async fn test_fs_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path());
        store.save("resume", "body").await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("resume.tex")]);
    }

    #[tokio::test]
    async fn test_fs_rejects_invalid_name() {
        let dir = tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path());
        assert!(matches!(
            store.save("../escape", "x").await,
            Err(StoreError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryTemplateStore::new();
        assert!(store.load("cover_letter").await.unwrap().is_none());
        store.save("cover_letter", "v1").await.unwrap();
        store.save("cover_letter", "v2").await.unwrap();
        assert_eq!(store.load("cover_letter").await.unwrap().unwrap().body, "v2");
    }
}
