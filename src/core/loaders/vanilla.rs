use async_trait::async_trait;
use tracing::debug;

use crate::core::error::LauncherResult;
use crate::core::version::VersionJson;

use super::context::InstallContext;
use super::installer::LoaderInstaller;

/// The upstream descriptor already is the vanilla descriptor.
pub struct VanillaInstaller;

#[async_trait]
impl LoaderInstaller for VanillaInstaller {
    async fn install(
        &self,
        ctx: InstallContext<'_>,
        descriptor: &mut VersionJson,
    ) -> LauncherResult<()> {
        debug!(
            "Vanilla {}: keeping {} libraries as published",
            ctx.minecraft_version,
            descriptor.libraries.len()
        );
        Ok(())
    }
}
