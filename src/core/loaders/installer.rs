use async_trait::async_trait;

use crate::core::error::LauncherResult;
use crate::core::instance::LoaderType;
use crate::core::version::VersionJson;

use super::{context::InstallContext, fabric::FabricInstaller, vanilla::VanillaInstaller};

#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    /// Fold the loader's libraries and entry point into `descriptor`.
    async fn install(
        &self,
        ctx: InstallContext<'_>,
        descriptor: &mut VersionJson,
    ) -> LauncherResult<()>;
}

/// Static dispatch over the supported loaders.
pub enum Installer {
    Vanilla(VanillaInstaller),
    Fabric(FabricInstaller),
}

impl Installer {
    pub fn new(loader: LoaderType, client: reqwest::Client) -> Self {
        match loader {
            LoaderType::Vanilla => Self::Vanilla(VanillaInstaller),
            LoaderType::Fabric => Self::Fabric(FabricInstaller::new(client)),
        }
    }

    pub async fn install(
        &self,
        ctx: InstallContext<'_>,
        descriptor: &mut VersionJson,
    ) -> LauncherResult<()> {
        match self {
            Installer::Vanilla(i) => i.install(ctx, descriptor).await,
            Installer::Fabric(i) => i.install(ctx, descriptor).await,
        }
    }
}
