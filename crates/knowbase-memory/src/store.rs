//! Directory-backed document store.
//!
//! The store is append-only while a session runs: uploads never overwrite an
//! existing file, and the only removal is the full [`DocumentStore::clear`]
//! performed when a session starts. Dot-files are invisible to every
//! operation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::document::DocumentError;

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete every regular, non-hidden file. A missing directory counts as empty.
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read, or a file
    /// cannot be removed.
    pub async fn clear(&self) -> Result<usize, DocumentError> {
        let paths = self.paths().await?;
        for path in &paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if !paths.is_empty() {
            tracing::info!(
                removed = paths.len(),
                dir = %self.root.display(),
                "cleared document store"
            );
        }
        Ok(paths.len())
    }

    /// Write `bytes` under `file_name` unless a file with that name exists.
    ///
    /// Returns `true` when a new file was created and `false` when the name
    /// was already taken, in which case the stored content is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidName`] for empty, hidden, or
    /// directory-only names, and an I/O error if the write fails.
    pub async fn add(&self, file_name: &str, bytes: &[u8]) -> Result<bool, DocumentError> {
        let name = sanitize_name(file_name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(&name);

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(file = %name, "document already stored, skipping");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }

        tracing::info!(file = %name, bytes = bytes.len(), "stored document");
        Ok(true)
    }

    /// Sorted names of the regular, non-hidden files currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub async fn list(&self) -> Result<Vec<String>, DocumentError> {
        Ok(self
            .paths()
            .await?
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect())
    }

    /// Full paths of the stored documents, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub async fn paths(&self) -> Result<Vec<PathBuf>, DocumentError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub async fn is_empty(&self) -> Result<bool, DocumentError> {
        Ok(self.paths().await?.is_empty())
    }
}

fn sanitize_name(file_name: &str) -> Result<String, DocumentError> {
    let name = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.trim().is_empty() || name.starts_with('.') {
        return Err(DocumentError::InvalidName(file_name.to_owned()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("doc"));

        assert!(store.add("b.txt", b"two").await.unwrap());
        assert!(store.add("a.txt", b"one").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn existing_name_is_first_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        assert!(store.add("notes.txt", b"original").await.unwrap());
        assert!(!store.add("notes.txt", b"replacement").await.unwrap());
        let content = std::fs::read(dir.path().join("notes.txt")).unwrap();
        assert_eq!(content, b"original");
    }

    #[tokio::test]
    async fn clear_removes_visible_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join(".gitkeep"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let store = DocumentStore::new(dir.path());

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.list().await.unwrap().is_empty());
        assert!(dir.path().join(".gitkeep").exists());
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        store.add("x.txt", b"x").await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 1);
        assert_eq!(store.clear().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("absent"));
        assert_eq!(store.clear().await.unwrap(), 0);
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn hidden_files_are_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "junk").unwrap();
        let store = DocumentStore::new(dir.path());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn path_components_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("doc"));
        assert!(store.add("../../escape.txt", b"x").await.unwrap());
        assert!(dir.path().join("doc").join("escape.txt").exists());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn invalid_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        for name in ["", "   ", ".env", "..", "/"] {
            let result = store.add(name, b"x").await;
            assert!(
                matches!(result, Err(DocumentError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn paths_are_full_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        store.add("z.md", b"z").await.unwrap();
        store.add("m.md", b"m").await.unwrap();
        let paths = store.paths().await.unwrap();
        assert_eq!(paths, vec![dir.path().join("m.md"), dir.path().join("z.md")]);
    }
}
