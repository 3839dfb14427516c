use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{info, warn};

use super::model::{Instance, InstanceConfig};
use crate::core::error::{LauncherError, LauncherResult};

/// Owns the on-disk lifecycle of instances.
pub struct InstanceManager {
    /// Root directory where all instances live.
    instances_dir: PathBuf,
}

impl InstanceManager {
    pub fn new(instances_dir: PathBuf) -> Self {
        Self { instances_dir }
    }

    /// Handle for `name`; nothing is touched on disk.
    pub fn instance(&self, name: &str) -> LauncherResult<Instance> {
        Instance::new(&self.instances_dir, name)
    }

    /// Handle for an instance that must already be installed.
    pub async fn open(&self, name: &str) -> LauncherResult<Instance> {
        let instance = self.instance(name)?;
        match tokio::fs::try_exists(instance.descriptor_path()).await {
            Ok(true) => Ok(instance),
            _ => Err(LauncherError::InstanceNotFound(name.to_string())),
        }
    }

    /// Wipe the instance directory and recreate its skeleton.
    ///
    /// A missing directory is fine; any other removal failure is returned.
    pub async fn reset(&self, instance: &Instance) -> LauncherResult<()> {
        match tokio::fs::remove_dir_all(&instance.root).await {
            Ok(()) => info!("Removed previous instance at {:?}", instance.root),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(LauncherError::io(&instance.root, e)),
        }

        let natives = instance.natives_dir();
        tokio::fs::create_dir_all(&natives)
            .await
            .map_err(|e| LauncherError::io(&natives, e))
    }

    pub async fn write_config(
        &self,
        instance: &Instance,
        config: &InstanceConfig,
    ) -> LauncherResult<()> {
        let path = instance.config_path();
        let json = serde_json::to_string(config)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }

    /// Read the persisted config. A missing or malformed file is replaced
    /// with defaults and never reported as an error.
    pub async fn read_config(&self, instance: &Instance) -> LauncherResult<InstanceConfig> {
        let path = instance.config_path();
        let parsed = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<InstanceConfig>(&raw).map_err(|e| e.to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err("file missing".to_string()),
            Err(e) => return Err(LauncherError::io(&path, e)),
        };

        match parsed {
            Ok(config) => Ok(config),
            Err(reason) => {
                warn!("Resetting config {:?} to defaults: {}", path, reason);
                let config = InstanceConfig::default();
                self.write_config(instance, &config).await?;
                Ok(config)
            }
        }
    }

    /// Every instance directory, sorted by name.
    pub async fn list(&self) -> LauncherResult<Vec<Instance>> {
        let mut entries = match tokio::fs::read_dir(&self.instances_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LauncherError::io(&self.instances_dir, e)),
        };

        let mut instances = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LauncherError::io(&self.instances_dir, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match self.instance(&name) {
                Ok(instance) => instances.push(instance),
                Err(e) => warn!("Skipping {:?}: {}", entry.path(), e),
            }
        }

        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }
}
