use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::paths::LauncherPaths;
use crate::core::downloader::{Downloader, ObjectStore};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::pool::WorkerPool;
use crate::core::version::VERSION_MANIFEST_URL;

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";
pub const LOADER_META_URL: &str = "https://meta.fabricmc.net/v2";
pub const LOADER_MAVEN_URL: &str = "https://maven.fabricmc.net/";
pub const OVERLAY_ARCHIVE_URL: &str =
    "https://codeload.github.com/ryanccn/spectral-m1-support/zip/refs/heads/main";

/// Remote locations the pipeline talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest_url: String,
    /// Base of hash-addressed asset objects (`<base>/<xx>/<hash>`).
    pub resources_url: String,
    pub loader_meta_url: String,
    /// Repository for loader coordinates that do not name their own.
    pub loader_maven_url: String,
    pub overlay_archive_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest_url: VERSION_MANIFEST_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            loader_meta_url: LOADER_META_URL.to_string(),
            loader_maven_url: LOADER_MAVEN_URL.to_string(),
            overlay_archive_url: OVERLAY_ARCHIVE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Worker-pool bound. `None` means one worker per CPU.
    pub concurrency: Option<usize>,
    /// Explicit Java binary, bypassing the `jres/` scan.
    pub java_path: Option<PathBuf>,
    pub username: String,
    pub max_memory_mb: u32,
    pub extra_jvm_args: Vec<String>,
    pub endpoints: Endpoints,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            concurrency: None,
            java_path: None,
            username: "Player".to_string(),
            max_memory_mb: 2048,
            extra_jvm_args: Vec::new(),
            endpoints: Endpoints::default(),
        }
    }
}

impl LauncherSettings {
    /// Read settings from `path`, falling back to defaults when the file is
    /// absent or unreadable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No settings at {:?} ({}), using defaults", path, e);
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn worker_pool(&self) -> WorkerPool {
        match self.concurrency {
            Some(limit) => WorkerPool::new(limit),
            None => WorkerPool::per_cpu(),
        }
    }
}

/// Everything one launcher process shares across commands.
pub struct AppState {
    pub paths: LauncherPaths,
    pub settings: LauncherSettings,
    pub http_client: Client,
    pub downloader: Arc<Downloader>,
    pub pool: WorkerPool,
}

impl AppState {
    /// Load settings from the data dir and build the shared clients.
    pub fn new(paths: LauncherPaths) -> LauncherResult<Self> {
        let settings = LauncherSettings::load(&paths.settings_path());
        Self::with_settings(paths, settings)
    }

    pub fn with_settings(paths: LauncherPaths, settings: LauncherSettings) -> LauncherResult<Self> {
        let http_client = build_http_client()?;
        let store = ObjectStore::new(paths.object_store_dir());
        let downloader = Arc::new(Downloader::new(http_client.clone(), store));
        let pool = settings.worker_pool();

        Ok(Self {
            paths,
            settings,
            http_client,
            downloader,
            pool,
        })
    }

    pub fn save_settings(&self) -> LauncherResult<()> {
        let path = self.paths.settings_path();
        let json = serde_json::to_string_pretty(&self.settings)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::io(&path, e))
    }
}
