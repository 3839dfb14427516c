use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::info;

use super::context::InstallContext;
use super::installer::LoaderInstaller;
use crate::core::downloader::{retry_with, FETCH_ATTEMPTS};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{CoordinateArtifact, Library, VersionJson};

/// Loader manifest served at `versions/loader/<game>/<loader>`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricLoaderManifest {
    pub loader: MavenRef,
    pub intermediary: MavenRef,
    pub launcher_meta: LauncherMeta,
}

#[derive(Debug, Deserialize)]
pub struct MavenRef {
    pub maven: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherMeta {
    pub libraries: LoaderLibraries,
    pub main_class: MainClass,
}

#[derive(Debug, Deserialize)]
pub struct LoaderLibraries {
    #[serde(default)]
    pub common: Vec<Library>,
    #[serde(default)]
    pub client: Vec<Library>,
    #[serde(default)]
    pub server: Vec<Library>,
}

/// Older manifests give one class, newer ones a per-side pair.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MainClass {
    Single(String),
    Split { client: String, server: String },
}

impl MainClass {
    pub fn client(&self) -> &str {
        match self {
            MainClass::Single(class) => class,
            MainClass::Split { client, .. } => client,
        }
    }
}

impl FabricLoaderManifest {
    /// Append common then client libraries, then intermediary and the loader
    /// itself, and switch the entry point to the client main class.
    pub fn merge_into(self, descriptor: &mut VersionJson, maven_url: &str) {
        let LauncherMeta {
            libraries,
            main_class,
        } = self.launcher_meta;

        descriptor.libraries.extend(libraries.common);
        descriptor.libraries.extend(libraries.client);
        descriptor.libraries.push(Library::Coordinate(CoordinateArtifact::new(
            self.intermediary.maven,
            maven_url,
        )));
        descriptor.libraries.push(Library::Coordinate(CoordinateArtifact::new(
            self.loader.maven,
            maven_url,
        )));
        descriptor.main_class = main_class.client().to_string();
    }
}

pub struct FabricInstaller {
    client: reqwest::Client,
}

impl FabricInstaller {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn manifest_url(meta_url: &str, game: &str, loader: &str) -> LauncherResult<Url> {
        let mut url = Url::parse(meta_url)
            .map_err(|e| LauncherError::LoaderApi(format!("Bad meta URL {}: {}", meta_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| LauncherError::LoaderApi(format!("Bad meta URL {}", meta_url)))?
            .pop_if_empty()
            .extend(["versions", "loader", game, loader]);
        Ok(url)
    }

    async fn fetch_manifest(
        &self,
        meta_url: &str,
        game: &str,
        loader: &str,
    ) -> LauncherResult<FabricLoaderManifest> {
        let url = Self::manifest_url(meta_url, game, loader)?;

        retry_with(FETCH_ATTEMPTS, LauncherError::is_transient, |_| async {
            let resp = self.client.get(url.clone()).send().await?;
            if !resp.status().is_success() {
                return Err(LauncherError::LoaderApi(format!(
                    "Fabric Meta returned {} for {}",
                    resp.status(),
                    url
                )));
            }
            let body = resp.text().await?;
            serde_json::from_str::<FabricLoaderManifest>(&body).map_err(|e| {
                LauncherError::LoaderApi(format!("Unexpected loader manifest from {}: {}", url, e))
            })
        })
        .await
    }
}

#[async_trait]
impl LoaderInstaller for FabricInstaller {
    async fn install(
        &self,
        ctx: InstallContext<'_>,
        descriptor: &mut VersionJson,
    ) -> LauncherResult<()> {
        let loader_version = ctx
            .loader_version
            .ok_or_else(|| LauncherError::LoaderApi("Fabric needs a loader version".into()))?;

        info!(
            "Merging Fabric {} into Minecraft {}",
            loader_version, ctx.minecraft_version
        );

        let manifest = self
            .fetch_manifest(ctx.meta_url, ctx.minecraft_version, loader_version)
            .await?;
        let base = descriptor.libraries.len();
        manifest.merge_into(descriptor, ctx.maven_url);

        info!(
            "Fabric added {} libraries, main class {}",
            descriptor.libraries.len() - base,
            descriptor.main_class
        );
        Ok(())
    }
}
