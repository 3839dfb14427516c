use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::core::downloader::{is_sha1_hex, DownloadEntry, Downloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::version_file::AssetIndexInfo;

/// Fetches the asset index and plans the hash-addressed object downloads.
pub struct AssetManager;

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetManager {
    pub fn index_path(assets_dir: &Path, index_id: &str) -> PathBuf {
        assets_dir.join("indexes").join(format!("{}.json", index_id))
    }

    /// `<assets>/objects/<xx>/<hash>`
    pub fn object_path(assets_dir: &Path, hash: &str) -> PathBuf {
        assets_dir.join("objects").join(&hash[..2]).join(hash)
    }

    /// Fetch the index document (hash-verified like any artifact) and parse it.
    pub async fn fetch_index(
        downloader: &Downloader,
        info: &AssetIndexInfo,
        assets_dir: &Path,
    ) -> LauncherResult<AssetIndex> {
        let index_path = Self::index_path(assets_dir, &info.id);
        downloader
            .download_file(&info.url, &index_path, info.sha1.as_deref())
            .await?;

        let raw = tokio::fs::read_to_string(&index_path)
            .await
            .map_err(|e| LauncherError::io(&index_path, e))?;
        let index: AssetIndex = serde_json::from_str(&raw)?;

        info!("Asset index '{}' lists {} objects", info.id, index.objects.len());
        Ok(index)
    }

    /// One download per distinct hash; URL and destination depend on the
    /// hash alone, so objects are shared by every instance.
    pub fn object_entries(
        index: &AssetIndex,
        assets_dir: &Path,
        resources_url: &str,
    ) -> LauncherResult<Vec<DownloadEntry>> {
        let base = resources_url.trim_end_matches('/');
        let mut by_hash: BTreeMap<String, u64> = BTreeMap::new();

        for (name, obj) in &index.objects {
            if !is_sha1_hex(&obj.hash) {
                return Err(LauncherError::Other(format!(
                    "Asset '{}' has an invalid hash: {}",
                    name, obj.hash
                )));
            }
            by_hash.insert(obj.hash.to_ascii_lowercase(), obj.size);
        }

        debug!(
            "{} asset names map to {} distinct objects",
            index.objects.len(),
            by_hash.len()
        );

        Ok(by_hash
            .into_iter()
            .map(|(hash, size)| {
                let url = format!("{}/{}/{}", base, &hash[..2], hash);
                DownloadEntry::new(url, Self::object_path(assets_dir, &hash))
                    .with_sha1(hash)
                    .with_size(size)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::*;
    use crate::core::downloader::ObjectStore;

    const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

    fn index(json: serde_json::Value) -> AssetIndex {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn entries_are_hash_addressed_and_deduplicated() {
        let index = index(serde_json::json!({"objects": {
            "minecraft/sounds/a.ogg": {"hash": HELLO_SHA1, "size": 5},
            "minecraft/sounds/b.ogg": {"hash": HELLO_SHA1, "size": 5},
            "icons/icon.png": {"hash": "0123456789abcdef0123456789abcdef01234567", "size": 9}
        }}));

        let entries =
            AssetManager::object_entries(&index, Path::new("/assets"), "https://res.example/")
                .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].url,
            "https://res.example/01/0123456789abcdef0123456789abcdef01234567"
        );
        assert_eq!(
            entries[1].dest,
            PathBuf::from(format!("/assets/objects/aa/{}", HELLO_SHA1))
        );
        assert_eq!(entries[1].sha1.as_deref(), Some(HELLO_SHA1));
        assert_eq!(entries[1].size, Some(5));
    }

    #[test]
    fn malformed_hash_is_rejected() {
        let index = index(serde_json::json!({"objects": {
            "evil": {"hash": "../../etc", "size": 1}
        }}));
        assert!(AssetManager::object_entries(&index, Path::new("/assets"), "https://r").is_err());
    }

    #[tokio::test]
    async fn index_is_fetched_to_indexes_dir() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(r#"{{"objects":{{"a":{{"hash":"{}","size":5}}}}}}"#, HELLO_SHA1);

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/indexes/5.json")
            .with_body(&body)
            .create_async()
            .await;

        let downloader = Downloader::new(Client::new(), ObjectStore::new(dir.path().join("store")));
        let info = AssetIndexInfo {
            id: "5".into(),
            url: format!("{}/indexes/5.json", server.url()),
            sha1: None,
            size: None,
            total_size: None,
        };

        let assets = dir.path().join("assets");
        let parsed = AssetManager::fetch_index(&downloader, &info, &assets)
            .await
            .unwrap();

        assert_eq!(parsed.objects["a"].hash, HELLO_SHA1);
        assert_eq!(
            std::fs::read_to_string(assets.join("indexes/5.json")).unwrap(),
            body
        );
        mock.assert_async().await;
    }
}
