use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    #[error("Stash I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat, directory-backed store of uploaded files keyed by file name.
///
/// There is no locking: concurrent writers to the same name race and the
/// last one wins.
#[derive(Debug, Clone)]
pub struct LocalStash {
    root: PathBuf,
}

impl LocalStash {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under `name`, creating the stash directory if needed.
    pub async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StashError> {
        let path = self.resolve(name)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, bytes).await?;
        tracing::debug!(name, size = bytes.len(), "stashed file");
        Ok(())
    }

    /// Names of all regular files currently stashed, in directory order.
    pub async fn list(&self) -> Result<Vec<String>, StashError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    pub async fn exists(&self, name: &str) -> Result<bool, StashError> {
        let path = self.resolve(name)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StashError> {
        let path = self.resolve(name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StashError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Maps a name onto a path directly inside the stash root. Anything that
    /// is not a single plain path component is refused.
    fn resolve(&self, name: &str) -> Result<PathBuf, StashError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if !name.contains(['/', '\\']) => {
                Ok(self.root.join(part))
            }
            _ => Err(StashError::InvalidName(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let stash = LocalStash::new(dir.path().join("uploads"));

        stash.put("sales.csv", b"first").await.unwrap();
        stash.put("sales.csv", b"second").await.unwrap();

        assert!(stash.exists("sales.csv").await.unwrap());
        assert_eq!(stash.read("sales.csv").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let stash = LocalStash::new(dir.path().join("never-created"));
        assert!(stash.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let stash = LocalStash::new(dir.path());
        stash.put("a.csv", b"x").await.unwrap();
        stash.put("b.json", b"[]").await.unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let mut names = stash.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a.csv", "b.json"]);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let stash = LocalStash::new(dir.path());
        assert!(!stash.exists("ghost.csv").await.unwrap());
        assert!(matches!(
            stash.read("ghost.csv").await,
            Err(StashError::NotFound(name)) if name == "ghost.csv"
        ));
    }

    #[tokio::test]
    async fn test_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let stash = LocalStash::new(dir.path());
        for name in ["../escape.csv", "a/b.csv", "..", ".", "", "/etc/passwd", "a\\b.csv"] {
            assert!(
                matches!(stash.put(name, b"x").await, Err(StashError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }
}
