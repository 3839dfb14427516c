use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Pick the Java binary to launch with.
///
/// An explicit path from settings wins. Otherwise the first binary found
/// under `jres_dir`, where the runtime installer unpacks distributions.
pub async fn resolve_java_binary(
    configured: Option<&Path>,
    jres_dir: &Path,
) -> LauncherResult<PathBuf> {
    if let Some(path) = configured {
        debug!("Using configured Java at {:?}", path);
        return Ok(path.to_path_buf());
    }

    let root = jres_dir.to_path_buf();
    let found = tokio::task::spawn_blocking(move || find_java_binary_recursive(&root))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?;

    match found {
        Some(path) => {
            info!("Found Java at {:?}", path);
            Ok(path)
        }
        None => Err(LauncherError::JavaNotFound(jres_dir.to_path_buf())),
    }
}

/// Depth-first, entries visited in name order so the choice is stable.
fn find_java_binary_recursive(root: &Path) -> Option<PathBuf> {
    let mut entries: Vec<_> = std::fs::read_dir(root).ok()?.filter_map(Result::ok).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_file() {
            if path.file_name().and_then(|n| n.to_str()) == Some(java_exe()) {
                return Some(path);
            }
        } else if file_type.is_dir() {
            if let Some(found) = find_java_binary_recursive(&path) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let configured = PathBuf::from("/opt/java/bin/java");
        let found = resolve_java_binary(Some(&configured), dir.path()).await.unwrap();
        assert_eq!(found, configured);
    }

    #[tokio::test]
    async fn scan_finds_nested_binary() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("jdk-17.0.9+9-jre/Contents/Home/bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join(java_exe()), b"").unwrap();
        std::fs::write(bin.join("keytool"), b"").unwrap();

        let found = resolve_java_binary(None, dir.path()).await.unwrap();
        assert_eq!(found, bin.join(java_exe()));
    }

    #[tokio::test]
    async fn empty_jres_dir_is_java_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_java_binary(None, &dir.path().join("jres")).await.unwrap_err();
        assert!(matches!(err, LauncherError::JavaNotFound(_)));
    }
}
