use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::downloader::path_exists;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::pool::WorkerPool;

/// Platform-specific Java classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Classpath order: overlay libraries ahead of the descriptor's own, the
/// client jar last.
pub fn assemble_classpath(
    overlay_libraries: Vec<PathBuf>,
    libraries: Vec<PathBuf>,
    client_jar: PathBuf,
) -> Vec<PathBuf> {
    let mut entries = overlay_libraries;
    entries.extend(libraries);
    entries.push(client_jar);
    entries
}

/// Check every path concurrently. The first missing one fails the barrier
/// with its own path in the error. Returns the canonical form of each path,
/// in input order.
pub async fn verify_present(pool: &WorkerPool, paths: &[PathBuf]) -> LauncherResult<Vec<PathBuf>> {
    let mut resolved = pool
        .barrier(
            "verify",
            paths.iter().enumerate().map(|(index, path)| async move {
                if !path_exists(path).await {
                    return Err(LauncherError::MissingDependency(path.clone()));
                }
                Ok((index, canonical_path(path).await))
            }),
        )
        .await?;
    resolved.sort_by_key(|(index, _)| *index);

    debug!("Verified {} launch dependencies", paths.len());
    Ok(resolved.into_iter().map(|(_, path)| path).collect())
}

/// Join already-resolved entries. Touches no filesystem.
pub fn join_classpath(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|entry| path_text(entry))
        .collect::<Vec<_>>()
        .join(get_classpath_separator())
}

/// Canonical path where it resolves, the input otherwise.
pub async fn canonical_path(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Convert path to string, canonical where possible.
pub async fn safe_path_str(path: &Path) -> String {
    path_text(&canonical_path(path).await)
}

/// String form of a path as Java expects it on the command line.
pub fn path_text(path: &Path) -> String {
    let text = path.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java rejects extended-length `\\?\C:\...` classpath entries.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_goes_first_and_client_last() {
        let entries = assemble_classpath(
            vec![PathBuf::from("/o/lwjgl.jar")],
            vec![PathBuf::from("/l/a.jar"), PathBuf::from("/l/b.jar")],
            PathBuf::from("/i/default.jar"),
        );
        assert_eq!(
            entries,
            vec![
                PathBuf::from("/o/lwjgl.jar"),
                PathBuf::from("/l/a.jar"),
                PathBuf::from("/l/b.jar"),
                PathBuf::from("/i/default.jar"),
            ]
        );
    }

    #[test]
    fn joined_with_platform_separator() {
        let joined = join_classpath(&[PathBuf::from("/nope/a.jar"), PathBuf::from("/nope/b.jar")]);
        let sep = get_classpath_separator();
        assert_eq!(joined, format!("/nope/a.jar{sep}/nope/b.jar"));
    }

    #[tokio::test]
    async fn missing_entry_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.jar");
        let missing = dir.path().join("b.jar");
        std::fs::write(&present, b"a").unwrap();

        verify_present(&WorkerPool::new(2), &[present.clone()])
            .await
            .unwrap();

        let err = verify_present(&WorkerPool::new(2), &[present, missing.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::MissingDependency(ref p) if *p == missing));
    }

    #[tokio::test]
    async fn verified_entries_are_canonical_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        let jars: Vec<PathBuf> = (0..12)
            .map(|i| {
                let jar = dir.path().join(format!("lib-{i}.jar"));
                std::fs::write(&jar, b"x").unwrap();
                jar
            })
            .collect();

        let mut requested = jars.clone();
        requested.push(dir.path().join("sub/../lib-0.jar"));

        let verified = verify_present(&WorkerPool::new(3), &requested).await.unwrap();
        let mut expected: Vec<PathBuf> = jars
            .iter()
            .map(|jar| std::fs::canonicalize(jar).unwrap())
            .collect();
        expected.push(std::fs::canonicalize(&jars[0]).unwrap());
        assert_eq!(verified, expected);
    }
}
