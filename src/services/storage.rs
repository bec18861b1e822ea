use std::path::{Path, PathBuf};
use tokio::fs;

/// Extensions never served back out of the image directory.
pub const FORBIDDEN_EXTENSIONS: &[&str] = &["txt"];

/// File store for uploaded images: a flat directory with one file per image,
/// named by the client filename or the content digest.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored file, for readers that want the file itself
    /// rather than its bytes.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Writes uploaded bytes under `name`, overwriting any same-named file.
    /// Names that could escape the storage root are refused.
    pub async fn save(&self, name: &str, bytes: &[u8]) -> std::io::Result<()> {
        if !is_safe_name(name) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "invalid file name",
            ));
        }
        fs::write(self.root.join(name), bytes).await
    }

    /// Reads a stored file back. Names that could escape the storage root
    /// are refused outright.
    pub async fn read(&self, name: &str) -> std::io::Result<Vec<u8>> {
        if !is_safe_name(name) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "invalid file name",
            ));
        }
        fs::read(self.root.join(name)).await
    }
}

/// A name is safe when it resolves to a direct child of the storage root.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && name != "." && name != ".."
}

/// True for filenames the raw-file route must answer with a 404.
pub fn has_forbidden_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    FORBIDDEN_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.save("photo.jpg", b"jpeg bytes").await.unwrap();
        let bytes = storage.read("photo.jpg").await.unwrap();
        assert_eq!(bytes, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.save("photo.jpg", b"first").await.unwrap();
        storage.save("photo.jpg", b"second").await.unwrap();
        assert_eq!(storage.read("photo.jpg").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.read("nope.png").await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_save_refuses_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        for name in ["../evil", "a/b.png", "..", ""] {
            let err = storage.save(name, b"payload").await.unwrap_err();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput, "name: {name:?}");
        }
        // Nothing escaped into the parent of the storage root.
        assert!(!dir.path().parent().unwrap().join("evil").exists());
    }

    #[tokio::test]
    async fn test_read_refuses_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        for name in ["../etc/passwd", "a/b.png", "..", ""] {
            let err = storage.read(name).await.unwrap_err();
            assert_eq!(err.kind(), std::io::ErrorKind::NotFound, "name: {name:?}");
        }
    }

    #[test]
    fn test_forbidden_extension() {
        assert!(has_forbidden_extension("notes.txt"));
        assert!(has_forbidden_extension("NOTES.TXT"));
        assert!(!has_forbidden_extension("photo.jpg"));
        assert!(!has_forbidden_extension("txt"));
    }
}
