// ─── Install Pipeline ───
// resolve → reset → descriptor (+ loader merge) → one fetch barrier → overlay → config.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::core::assets::AssetManager;
use crate::core::downloader::DownloadEntry;
use crate::core::error::LauncherResult;
use crate::core::instance::{Instance, InstanceConfig, InstanceManager, LoaderType};
use crate::core::libraries::{install_overlay, resolve_libraries, FetchTask, ResolveContext};
use crate::core::loaders::{InstallContext, Installer};
use crate::core::state::AppState;
use crate::core::version::{Platform, VersionJson, VersionManifest};

#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub name: String,
    pub minecraft_version: String,
    /// Fabric loader version; `None` installs vanilla.
    pub loader_version: Option<String>,
    pub overlay: bool,
}

impl InstallRequest {
    pub fn loader(&self) -> LoaderType {
        if self.loader_version.is_some() {
            LoaderType::Fabric
        } else {
            LoaderType::Vanilla
        }
    }
}

#[derive(Debug)]
pub struct InstallSummary {
    pub instance: Instance,
    pub config: InstanceConfig,
    pub fetch_tasks: usize,
    pub skipped_libraries: Vec<String>,
}

/// Full reinstall of `request.name`. Any failure aborts the remaining
/// phases and leaves whatever was already written in place.
pub async fn install(state: &AppState, request: &InstallRequest) -> LauncherResult<InstallSummary> {
    let started = Instant::now();
    let paths = &state.paths;
    let endpoints = &state.settings.endpoints;
    let manager = InstanceManager::new(paths.instances_dir());
    let instance = manager.instance(&request.name)?;
    paths.ensure_roots().await?;

    // 1. Resolve the version id
    let manifest = VersionManifest::fetch(&state.http_client, &endpoints.version_manifest_url).await?;
    let entry = manifest.find_version(&request.minecraft_version)?;

    // 2. Every install starts from an empty instance
    manager.reset(&instance).await?;

    // 3. Descriptor, optionally merged with the loader
    let descriptor_path = instance.descriptor_path();
    info!("Downloading descriptor for {}", entry.id);
    state
        .downloader
        .download_file(&entry.url, &descriptor_path, entry.sha1.as_deref())
        .await?;
    let mut descriptor = VersionJson::load(&descriptor_path).await?;

    let loader = request.loader();
    if loader != LoaderType::Vanilla {
        Installer::new(loader, state.http_client.clone())
            .install(
                InstallContext {
                    minecraft_version: &request.minecraft_version,
                    loader_version: request.loader_version.as_deref(),
                    meta_url: &endpoints.loader_meta_url,
                    maven_url: &endpoints.loader_maven_url,
                },
                &mut descriptor,
            )
            .await?;
        descriptor.save(&descriptor_path).await?;
    }

    // 4. Plan every fetch of the install
    let mut tasks = Vec::new();

    match descriptor.downloads.as_ref().and_then(|d| d.client.as_ref()) {
        Some(client) => tasks.push(FetchTask::Artifact(
            DownloadEntry::new(&client.url, instance.client_jar_path())
                .with_sha1(&client.sha1)
                .with_size(client.size),
        )),
        None => warn!("Descriptor {} has no client download", descriptor.id),
    }

    let ctx = ResolveContext {
        platform: Platform::current(),
        libraries_dir: paths.libraries_dir(),
        natives_dir: instance.natives_dir(),
        temp_dir: paths.temp_dir().to_path_buf(),
        default_repository: endpoints.loader_maven_url.clone(),
        overlay_active: request.overlay,
    };
    let resolved = resolve_libraries(&descriptor.libraries, &ctx)?;
    tasks.extend(resolved.tasks);

    match &descriptor.asset_index {
        Some(info) => {
            let assets_dir = paths.assets_dir();
            let index = AssetManager::fetch_index(&state.downloader, info, &assets_dir).await?;
            let objects =
                AssetManager::object_entries(&index, &assets_dir, &endpoints.resources_url)?;
            tasks.extend(objects.into_iter().map(FetchTask::Artifact));
        }
        None => warn!("Descriptor {} has no asset index", descriptor.id),
    }

    // 5. One barrier for client, libraries, natives and assets
    let fetch_tasks = tasks.len();
    let downloader = &state.downloader;
    state
        .pool
        .barrier("fetch", tasks.iter().map(|task| task.run(downloader)))
        .await?;

    // 6. Overlay replaces the superseded libraries
    if request.overlay {
        install_overlay(
            downloader,
            &endpoints.overlay_archive_url,
            paths.temp_dir(),
            &paths.overlay_dir(),
        )
        .await?;
    }

    // 7. Persist the instance config
    let config = InstanceConfig {
        using_overlay: request.overlay,
        minecraft_version: Some(request.minecraft_version.clone()),
        loader,
        loader_version: request.loader_version.clone(),
        installed_at: Some(Utc::now()),
    };
    manager.write_config(&instance, &config).await?;

    info!(
        "Installed '{}' ({} {}) in {:.2?}",
        instance.name,
        loader,
        request.minecraft_version,
        started.elapsed()
    );

    Ok(InstallSummary {
        instance,
        config,
        fetch_tasks,
        skipped_libraries: resolved.skipped,
    })
}
