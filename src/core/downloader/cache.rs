use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// Content-addressed blob store shared by every instance and every install.
///
/// Objects live at `<root>/<first two hex chars>/<sha1>`. An object is only
/// ever written under the hash of its own bytes, so concurrent writers of
/// the same key always race to produce identical files.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Sharded location of `hash`, or `None` when `hash` is not a SHA-1 hex digest.
    pub fn object_path(&self, hash: &str) -> Option<PathBuf> {
        if !is_sha1_hex(hash) {
            return None;
        }
        let hash = hash.to_ascii_lowercase();
        Some(self.root.join(&hash[..2]).join(hash))
    }

    pub async fn contains(&self, hash: &str) -> bool {
        match self.object_path(hash) {
            Some(path) => path_exists(&path).await,
            None => false,
        }
    }

    /// Copy the object for `hash` to `dest`. Returns `false` on a cache miss.
    pub async fn copy_to(&self, hash: &str, dest: &Path) -> LauncherResult<bool> {
        let Some(object) = self.object_path(hash) else {
            return Ok(false);
        };
        if !path_exists(&object).await {
            return Ok(false);
        }

        copy_atomically(&object, dest).await?;
        debug!("Cache hit {} -> {:?}", hash, dest);
        Ok(true)
    }

    /// Store a copy of `source`, whose bytes hash to `hash`.
    pub async fn insert(&self, hash: &str, source: &Path) -> LauncherResult<()> {
        let Some(object) = self.object_path(hash) else {
            return Err(LauncherError::Other(format!(
                "refusing to cache object under malformed hash {hash:?}"
            )));
        };
        if path_exists(&object).await {
            return Ok(());
        }

        if let Some(parent) = object.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        copy_atomically(source, &object).await
    }
}

/// 40 hex characters.
pub fn is_sha1_hex(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Streaming SHA-1 of a file on disk, lowercase hex.
pub async fn sha1_file(path: &Path) -> LauncherResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let read = file
            .read(&mut buf)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Sibling scratch file used while `dest` is being produced.
pub fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
}

/// Copy `source` to `dest` through a scratch file so readers never observe
/// a half-written `dest`.
pub async fn copy_atomically(source: &Path, dest: &Path) -> LauncherResult<()> {
    let scratch = partial_path(dest);

    if let Err(e) = tokio::fs::copy(source, &scratch).await {
        let _ = tokio::fs::remove_file(&scratch).await;
        return Err(LauncherError::io(source, e));
    }
    if let Err(e) = tokio::fs::rename(&scratch, dest).await {
        let _ = tokio::fs::remove_file(&scratch).await;
        return Err(LauncherError::io(dest, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

    #[test]
    fn object_path_is_sharded_by_hash_prefix() {
        let store = ObjectStore::new(PathBuf::from("/cache/sha1"));
        assert_eq!(
            store.object_path(HELLO_SHA1),
            Some(PathBuf::from(format!("/cache/sha1/aa/{HELLO_SHA1}")))
        );
    }

    #[test]
    fn malformed_hashes_have_no_object_path() {
        let store = ObjectStore::new(PathBuf::from("/cache/sha1"));
        assert_eq!(store.object_path("../../etc/passwd"), None);
        assert_eq!(store.object_path("abc"), None);
    }

    #[tokio::test]
    async fn sha1_file_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();
        assert_eq!(sha1_file(&path).await.unwrap(), HELLO_SHA1);
    }

    #[tokio::test]
    async fn insert_then_copy_roundtrips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join("sha1"));
        let source = dir.path().join("source.txt");
        tokio::fs::write(&source, b"hello").await.unwrap();

        assert!(!store.contains(HELLO_SHA1).await);
        store.insert(HELLO_SHA1, &source).await.unwrap();
        assert!(store.contains(HELLO_SHA1).await);

        let dest = dir.path().join("out").join("copy.txt");
        tokio::fs::create_dir_all(dest.parent().unwrap()).await.unwrap();
        assert!(store.copy_to(HELLO_SHA1, &dest).await.unwrap());
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn copy_to_reports_miss_without_touching_dest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join("sha1"));
        let dest = dir.path().join("never.txt");
        assert!(!store.copy_to(HELLO_SHA1, &dest).await.unwrap());
        assert!(!path_exists(&dest).await);
    }
}
