// ─── Platform Overlay ───
// A compatibility patch shipping its own libraries and natives.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::archive;
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};

/// Download the overlay archive and unpack it over `overlay_dir`.
///
/// The archive is not versioned upstream, so it is fetched on every install.
pub async fn install_overlay(
    downloader: &Downloader,
    archive_url: &str,
    temp_dir: &Path,
    overlay_dir: &Path,
) -> LauncherResult<()> {
    let scratch = temp_dir.join(format!("overlay-{}.zip", Uuid::new_v4()));
    downloader.download_file(archive_url, &scratch, None).await?;

    let unpacked = archive::extract_stripping_root(&scratch, overlay_dir).await;
    if let Err(e) = tokio::fs::remove_file(&scratch).await {
        warn!("Could not remove overlay archive {:?}: {}", scratch, e);
    }

    info!("Overlay installed: {} files in {:?}", unpacked?, overlay_dir);
    Ok(())
}

/// Every file directly under `<overlay>/libraries`, sorted by name.
pub async fn overlay_libraries(overlay_dir: &Path) -> LauncherResult<Vec<PathBuf>> {
    let dir = overlay_dir.join("libraries");
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| LauncherError::io(&dir, e))?;

    let mut libraries = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LauncherError::io(&dir, e))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            libraries.push(entry.path());
        }
    }

    libraries.sort();
    Ok(libraries)
}

pub fn overlay_natives_dir(overlay_dir: &Path) -> PathBuf {
    overlay_dir.join("natives")
}
