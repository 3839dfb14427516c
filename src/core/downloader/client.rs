use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::cache::{partial_path, path_exists, sha1_file, ObjectStore};
use super::retry::{retry_with, FETCH_ATTEMPTS};
use crate::core::error::{LauncherError, LauncherResult};

/// A single file to fetch, with an optional SHA-1 to verify against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

impl DownloadEntry {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            sha1: None,
            size: None,
        }
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// How a successful fetch was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// `dest` already held the expected bytes.
    AlreadyPresent,
    /// Copied out of the shared object store.
    FromCache,
    /// Streamed from the network.
    Downloaded,
}

/// Verified, cache-backed, retrying downloader.
pub struct Downloader {
    client: Client,
    store: ObjectStore,
}

impl Downloader {
    pub fn new(client: Client, store: ObjectStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub async fn fetch(&self, entry: &DownloadEntry) -> LauncherResult<FetchOutcome> {
        self.download_file(&entry.url, &entry.dest, entry.sha1.as_deref())
            .await
    }

    /// Make `dest` hold the bytes behind `url`.
    ///
    /// When `sha1_expected` is given, success guarantees `dest` hashes to it.
    /// Transient failures (network, disk, hash mismatch) are retried up to
    /// the attempt budget; the last error is returned.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<FetchOutcome> {
        retry_with(FETCH_ATTEMPTS, LauncherError::is_transient, |_| {
            self.download_once(url, dest, sha1_expected)
        })
        .await
    }

    /// One raw attempt, no retries.
    async fn download_once(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<FetchOutcome> {
        // 1. Already in place?
        if path_exists(dest).await {
            if let Some(expected) = sha1_expected {
                if sha1_file(dest).await?.eq_ignore_ascii_case(expected) {
                    debug!("Up to date: {:?}", dest);
                    return Ok(FetchOutcome::AlreadyPresent);
                }
            }
            remove_if_present(dest).await?;
        }

        // 2. Parent directories
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        // 3. Shared object store
        if let Some(expected) = sha1_expected {
            if self.store.copy_to(expected, dest).await? {
                return Ok(FetchOutcome::FromCache);
            }
        }

        // 4. Network, hashed while streaming into a scratch file
        let scratch = partial_path(dest);
        let actual = match self.stream_to(url, &scratch).await {
            Ok(actual) => actual,
            Err(e) => {
                let _ = tokio::fs::remove_file(&scratch).await;
                return Err(e);
            }
        };

        if let Some(expected) = sha1_expected {
            if !actual.eq_ignore_ascii_case(expected) {
                let _ = tokio::fs::remove_file(&scratch).await;
                return Err(LauncherError::HashMismatch {
                    url: url.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Err(e) = tokio::fs::rename(&scratch, dest).await {
            let _ = tokio::fs::remove_file(&scratch).await;
            return Err(LauncherError::io(dest, e));
        }

        // 5. Publish to the store so identical bytes from any URL hit the cache
        if let Err(e) = self.store.insert(&actual, dest).await {
            warn!("Could not cache {:?} as {}: {}", dest, actual, e);
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(FetchOutcome::Downloaded)
    }

    async fn stream_to(&self, url: &str, scratch: &Path) -> LauncherResult<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut hasher = Sha1::new();
        // Scoped so the handle is closed before the rename (Windows).
        {
            let mut file = tokio::fs::File::create(scratch)
                .await
                .map_err(|e| LauncherError::io(scratch, e))?;
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                hasher.update(&chunk);
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::io(scratch, e))?;
            }

            file.flush()
                .await
                .map_err(|e| LauncherError::io(scratch, e))?;
        }

        Ok(hex::encode(hasher.finalize()))
    }
}

async fn remove_if_present(path: &Path) -> LauncherResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LauncherError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_http_client;

    const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

    fn downloader(root: &Path) -> Downloader {
        Downloader::new(
            build_http_client().unwrap(),
            ObjectStore::new(root.join("cache").join("sha1")),
        )
    }

    #[tokio::test]
    async fn second_fetch_is_a_pure_hash_check() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/hello.txt")
            .with_body("hello")
            .expect(1)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dl = downloader(dir.path());
        let dest = dir.path().join("out").join("hello.txt");
        let url = format!("{}/hello.txt", server.url());

        let first = dl.download_file(&url, &dest, Some(HELLO_SHA1)).await.unwrap();
        let second = dl.download_file(&url, &dest, Some(HELLO_SHA1)).await.unwrap();

        assert_eq!(first, FetchOutcome::Downloaded);
        assert_eq!(second, FetchOutcome::AlreadyPresent);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn cached_hash_is_served_without_network() {
        let mut server = mockito::Server::new_async().await;
        let first_url = server
            .mock("GET", "/a.txt")
            .with_body("hello")
            .expect(1)
            .create_async()
            .await;
        let other_url = server
            .mock("GET", "/b.txt")
            .with_body("hello")
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dl = downloader(dir.path());

        dl.download_file(
            &format!("{}/a.txt", server.url()),
            &dir.path().join("a.txt"),
            Some(HELLO_SHA1),
        )
        .await
        .unwrap();
        let outcome = dl
            .download_file(
                &format!("{}/b.txt", server.url()),
                &dir.path().join("b.txt"),
                Some(HELLO_SHA1),
            )
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::FromCache);
        assert_eq!(
            tokio::fs::read(dir.path().join("b.txt")).await.unwrap(),
            b"hello"
        );
        first_url.assert_async().await;
        other_url.assert_async().await;
    }

    #[tokio::test]
    async fn hash_mismatch_is_retried_then_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bad.txt")
            .with_body("tampered")
            .expect(3)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dl = downloader(dir.path());
        let dest = dir.path().join("bad.txt");

        let err = dl
            .download_file(&format!("{}/bad.txt", server.url()), &dest, Some(HELLO_SHA1))
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::HashMismatch { .. }));
        assert!(!path_exists(&dest).await);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn stale_destination_is_replaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/hello.txt")
            .with_body("hello")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dl = downloader(dir.path());
        let dest = dir.path().join("hello.txt");
        tokio::fs::write(&dest, b"stale").await.unwrap();

        let outcome = dl
            .download_file(
                &format!("{}/hello.txt", server.url()),
                &dest,
                Some(HELLO_SHA1),
            )
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::Downloaded);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn http_errors_surface_after_retry_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing.jar")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dl = downloader(dir.path());

        let err = dl
            .download_file(
                &format!("{}/missing.jar", server.url()),
                &dir.path().join("missing.jar"),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::DownloadFailed { status: 500, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn concurrent_identical_content_converges_on_one_object() {
        let mut server = mockito::Server::new_async().await;
        let _a = server
            .mock("GET", "/a")
            .with_body("hello")
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/b")
            .with_body("hello")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dl = downloader(dir.path());
        let (url_a, url_b) = (format!("{}/a", server.url()), format!("{}/b", server.url()));
        let (dest_a, dest_b) = (dir.path().join("a"), dir.path().join("b"));

        let (ra, rb) = tokio::join!(
            dl.download_file(&url_a, &dest_a, None),
            dl.download_file(&url_b, &dest_b, None),
        );
        ra.unwrap();
        rb.unwrap();

        let shard = dir.path().join("cache").join("sha1").join("aa");
        let objects: Vec<_> = std::fs::read_dir(&shard)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(objects, vec![HELLO_SHA1.to_string()]);
        assert_eq!(std::fs::read(&dest_a).unwrap(), std::fs::read(&dest_b).unwrap());
    }
}
