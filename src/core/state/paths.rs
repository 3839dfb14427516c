use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::APP_NAME;

/// Every filesystem root the launcher touches.
///
/// Built once at startup and handed to each component; nothing below this
/// layer looks up platform directories on its own.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    data_dir: PathBuf,
    cache_dir: PathBuf,
    temp_dir: PathBuf,
}

impl LauncherPaths {
    pub fn new(data_dir: PathBuf, cache_dir: PathBuf, temp_dir: PathBuf) -> Self {
        Self {
            data_dir,
            cache_dir,
            temp_dir,
        }
    }

    /// Platform defaults: `<data>/Spectral`, `<cache>/Spectral`, `<tmp>/Spectral`.
    pub fn platform_default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME);
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| data_dir.join("cache"))
            .join(APP_NAME);
        let temp_dir = std::env::temp_dir().join(APP_NAME);
        Self::new(data_dir, cache_dir, temp_dir)
    }

    /// Keep the platform cache/temp roots but relocate user data.
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    /// All roots under one directory. Handy for tests and portable installs.
    pub fn rooted_at(root: &Path) -> Self {
        Self::new(root.join("data"), root.join("cache"), root.join("tmp"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.data_dir.join("instances")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }

    pub fn overlay_dir(&self) -> PathBuf {
        self.data_dir.join("overlay")
    }

    /// Where the external runtime installer unpacks Java distributions.
    pub fn jres_dir(&self) -> PathBuf {
        self.data_dir.join("jres")
    }

    /// Root of the process-wide content-addressed object store.
    pub fn object_store_dir(&self) -> PathBuf {
        self.cache_dir.join("sha1")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("launcher_settings.json")
    }

    /// Create the roots that must exist before any install runs.
    pub async fn ensure_roots(&self) -> LauncherResult<()> {
        for dir in [
            self.data_dir.clone(),
            self.cache_dir.clone(),
            self.temp_dir.clone(),
            self.instances_dir(),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| LauncherError::io(&dir, e))?;
        }
        Ok(())
    }
}
