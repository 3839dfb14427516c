// ─── Version Manifest ───
// Fetching and querying the upstream version index (v2, with per-entry sha1).

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::downloader::{retry_with, FETCH_ATTEMPTS};
use crate::core::error::{LauncherError, LauncherResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    pub time: DateTime<Utc>,
    pub release_time: DateTime<Utc>,
    /// Present in the v2 index only.
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetch and parse the index at `url`, retrying transient failures.
    pub async fn fetch(client: &Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching version manifest from {}", url);

        let manifest: VersionManifest =
            retry_with(FETCH_ATTEMPTS, LauncherError::is_transient, |_| async {
                let response = client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LauncherError::DownloadFailed {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.json::<VersionManifest>().await?)
            })
            .await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Look up a version by exact id (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> LauncherResult<&VersionEntry> {
        self.versions
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))
    }

    /// Release entries only, newest first as served.
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }
}
