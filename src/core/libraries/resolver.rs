// ─── Library Resolver ───
// Flattens a descriptor's library list into fetch tasks plus the classpath.

use std::path::PathBuf;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::archive;
use crate::core::downloader::{DownloadEntry, Downloader};
use crate::core::error::LauncherResult;
use crate::core::maven::MavenArtifact;
use crate::core::version::{CoordinateArtifact, Library, Platform, PlatformArtifact};

/// Name fragments of libraries the overlay ships its own builds of.
pub const OVERLAY_SUPERSEDED: [&str; 2] = ["lwjgl", "objc-bridge"];

/// Inputs the resolver needs besides the library list itself.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub platform: Platform,
    pub libraries_dir: PathBuf,
    pub natives_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// Used for coordinate libraries that do not name a repository.
    pub default_repository: String,
    pub overlay_active: bool,
}

/// A unit of work for the install fetch barrier.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTask {
    Artifact(DownloadEntry),
    /// Fetched to a scratch jar, unpacked into `natives_dir`, then removed.
    NativeBundle {
        entry: DownloadEntry,
        natives_dir: PathBuf,
        suffix: &'static str,
    },
}

impl FetchTask {
    pub async fn run(&self, downloader: &Downloader) -> LauncherResult<()> {
        match self {
            FetchTask::Artifact(entry) => {
                downloader.fetch(entry).await?;
            }
            FetchTask::NativeBundle {
                entry,
                natives_dir,
                suffix,
            } => {
                downloader.fetch(entry).await?;
                let extracted = archive::extract_matching(&entry.dest, natives_dir, suffix).await?;
                debug!("Unpacked {} natives from {}", extracted.len(), entry.url);

                if let Err(e) = tokio::fs::remove_file(&entry.dest).await {
                    warn!("Could not remove native bundle {:?}: {}", entry.dest, e);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ResolvedLibraries {
    /// Absolute library paths in descriptor order.
    pub classpath: Vec<PathBuf>,
    pub tasks: Vec<FetchTask>,
    /// Names dropped because the overlay supersedes them.
    pub skipped: Vec<String>,
}

pub fn is_superseded_by_overlay(name: &str) -> bool {
    OVERLAY_SUPERSEDED.iter().any(|needle| name.contains(needle))
}

/// Walk `libraries` in order. Rule-rejected and overlay-superseded entries
/// contribute neither a fetch nor a classpath entry.
pub fn resolve_libraries(
    libraries: &[Library],
    ctx: &ResolveContext,
) -> LauncherResult<ResolvedLibraries> {
    let mut resolved = ResolvedLibraries::default();

    for library in libraries {
        if ctx.overlay_active && is_superseded_by_overlay(library.name()) {
            warn!("Skipping {} as the overlay provides it", library.name());
            resolved.skipped.push(library.name().to_string());
            continue;
        }

        match library {
            Library::Platform(lib) => resolve_platform(lib, ctx, &mut resolved),
            Library::Coordinate(lib) => resolve_coordinate(lib, ctx, &mut resolved)?,
        }
    }

    debug!(
        "Resolved {} classpath entries, {} fetch tasks",
        resolved.classpath.len(),
        resolved.tasks.len()
    );
    Ok(resolved)
}

fn resolve_platform(lib: &PlatformArtifact, ctx: &ResolveContext, out: &mut ResolvedLibraries) {
    if !lib.is_allowed_on(&ctx.platform) {
        debug!("Rules exclude {}", lib.name);
        return;
    }

    if let Some(artifact) = &lib.downloads.artifact {
        let dest = ctx.libraries_dir.join(&artifact.path);
        out.classpath.push(dest.clone());
        out.tasks.push(FetchTask::Artifact(
            DownloadEntry::new(&artifact.url, dest)
                .with_sha1(&artifact.sha1)
                .with_size(artifact.size),
        ));
    }

    for bundle in lib.native_bundles_for(&ctx.platform) {
        let scratch = ctx.temp_dir.join(format!(
            "{}-native-{}.jar",
            sanitize_file_stem(&lib.name),
            Uuid::new_v4()
        ));
        out.tasks.push(FetchTask::NativeBundle {
            entry: DownloadEntry::new(&bundle.url, scratch)
                .with_sha1(&bundle.sha1)
                .with_size(bundle.size),
            natives_dir: ctx.natives_dir.clone(),
            suffix: ctx.platform.os.native_suffix(),
        });
    }
}

fn resolve_coordinate(
    lib: &CoordinateArtifact,
    ctx: &ResolveContext,
    out: &mut ResolvedLibraries,
) -> LauncherResult<()> {
    let artifact = MavenArtifact::parse(&lib.name)?;
    let repository = lib.url.as_deref().unwrap_or(&ctx.default_repository);

    let dest = artifact.local_file(&ctx.libraries_dir);
    out.classpath.push(dest.clone());
    out.tasks
        .push(FetchTask::Artifact(DownloadEntry::new(artifact.url(repository)?, dest)));
    Ok(())
}

fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

/// Classpath-only view used at launch time; never schedules work.
pub fn library_classpath(libraries: &[Library], ctx: &ResolveContext) -> LauncherResult<Vec<PathBuf>> {
    Ok(resolve_libraries(libraries, ctx)?.classpath)
}
