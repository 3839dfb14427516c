use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::core::error::LauncherError;
use crate::core::install::{self, InstallRequest};
use crate::core::instance::{Instance, InstanceConfig, InstanceManager, LoaderType};
use crate::core::launch;
use crate::core::state::AppState;
use crate::core::version::VersionManifest;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinecraftVersionInfo {
    pub id: String,
    pub version_type: String,
    pub release_time: DateTime<Utc>,
    pub latest: bool,
}

/// Listing view of one instance and its persisted config.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub name: String,
    pub path: String,
    pub minecraft_version: Option<String>,
    pub loader: LoaderType,
    pub loader_version: Option<String>,
    pub using_overlay: bool,
    pub installed_at: Option<DateTime<Utc>>,
}

impl From<(&Instance, &InstanceConfig)> for InstanceInfo {
    fn from((inst, config): (&Instance, &InstanceConfig)) -> Self {
        Self {
            name: inst.name.clone(),
            path: inst.root.to_string_lossy().to_string(),
            minecraft_version: config.minecraft_version.clone(),
            loader: config.loader,
            loader_version: config.loader_version.clone(),
            using_overlay: config.using_overlay,
            installed_at: config.installed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Rendered command line; nothing was spawned.
    DryRun(String),
    Spawned { pid: u32 },
}

/// Release versions of the remote index, newest first.
pub async fn get_minecraft_versions(
    state: &AppState,
) -> Result<Vec<MinecraftVersionInfo>, LauncherError> {
    let manifest = VersionManifest::fetch(
        &state.http_client,
        &state.settings.endpoints.version_manifest_url,
    )
    .await?;

    let latest = manifest.latest.release.clone();
    let versions = manifest
        .releases()
        .into_iter()
        .filter(|entry| !entry.id.to_ascii_lowercase().contains("demo"))
        .map(|entry| MinecraftVersionInfo {
            id: entry.id.clone(),
            version_type: entry.version_type.clone(),
            release_time: entry.release_time,
            latest: entry.id == latest,
        })
        .collect();

    Ok(versions)
}

pub async fn create_instance(
    state: &AppState,
    request: InstallRequest,
) -> Result<InstanceInfo, LauncherError> {
    let summary = install::install(state, &request).await?;
    if !summary.skipped_libraries.is_empty() {
        info!(
            "Overlay supersedes {} libraries: {}",
            summary.skipped_libraries.len(),
            summary.skipped_libraries.join(", ")
        );
    }
    Ok(InstanceInfo::from((&summary.instance, &summary.config)))
}

pub async fn list_instances(state: &AppState) -> Result<Vec<InstanceInfo>, LauncherError> {
    let manager = InstanceManager::new(state.paths.instances_dir());
    let mut infos = Vec::new();
    for instance in manager.list().await? {
        let config = manager.read_config(&instance).await?;
        infos.push(InstanceInfo::from((&instance, &config)));
    }
    Ok(infos)
}

pub async fn launch_instance(
    state: &AppState,
    name: &str,
    dry_run: bool,
) -> Result<LaunchOutcome, LauncherError> {
    let plan = launch::prepare_launch(state, name).await?;
    if dry_run {
        return Ok(LaunchOutcome::DryRun(plan.command_line()));
    }

    let pid = launch::spawn_detached(&plan)?;
    Ok(LaunchOutcome::Spawned { pid })
}
