// ─── Archive Extraction ───
// Native bundle and overlay unpacking. Runs on the blocking pool.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Extract every entry whose file name ends with `suffix` into `dest_dir`,
/// flattening directory components. `META-INF/` is never extracted.
///
/// Returns the extracted file names. Existing files are overwritten.
pub async fn extract_matching(
    archive_path: &Path,
    dest_dir: &Path,
    suffix: &str,
) -> LauncherResult<Vec<String>> {
    let archive_path = archive_path.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();
    let suffix = suffix.to_ascii_lowercase();

    tokio::task::spawn_blocking(move || extract_matching_blocking(&archive_path, &dest_dir, &suffix))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
}

fn extract_matching_blocking(
    archive_path: &Path,
    dest_dir: &Path,
    suffix: &str,
) -> LauncherResult<Vec<String>> {
    let file = File::open(archive_path).map_err(|e| LauncherError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    std::fs::create_dir_all(dest_dir).map_err(|e| LauncherError::io(dest_dir, e))?;

    let mut extracted = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || entry.name().contains("META-INF") {
            continue;
        }

        let Some(file_name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        else {
            continue;
        };
        if !file_name.to_ascii_lowercase().ends_with(suffix) {
            continue;
        }

        let dest = dest_dir.join(&file_name);
        let mut out = File::create(&dest).map_err(|e| LauncherError::io(&dest, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&dest, e))?;
        debug!("Extracted native: {}", file_name);
        extracted.push(file_name);
    }

    Ok(extracted)
}

/// Unpack a whole archive into `dest_dir`, dropping the first path
/// component of every entry (the `<repo>-<branch>/` root of a source zip).
///
/// Returns the number of files written.
pub async fn extract_stripping_root(archive_path: &Path, dest_dir: &Path) -> LauncherResult<usize> {
    let archive_path = archive_path.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();

    tokio::task::spawn_blocking(move || extract_stripping_root_blocking(&archive_path, &dest_dir))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
}

fn extract_stripping_root_blocking(archive_path: &Path, dest_dir: &Path) -> LauncherResult<usize> {
    let file = File::open(archive_path).map_err(|e| LauncherError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(enclosed) = entry.enclosed_name() else {
            continue;
        };
        let relative: PathBuf = enclosed
            .components()
            .skip(1)
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        if relative.as_os_str().is_empty() {
            continue;
        }

        let dest = dest_dir.join(&relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| LauncherError::io(&dest, e))?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = File::create(&dest).map_err(|e| LauncherError::io(&dest, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&dest, e))?;
        written += 1;
    }

    debug!("Unpacked {} files from {:?}", written, archive_path);
    Ok(written)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    /// Build a zip at `path` from `(name, contents)` pairs; names ending in
    /// `/` become directory entries.
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(contents).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn only_matching_natives_are_extracted_flat() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("natives.jar");
        write_zip(
            &jar,
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
                ("META-INF/libsigned.so", b"nope"),
                ("liblwjgl.so", b"elf"),
                ("linux/x64/org/lwjgl/libglfw.so", b"elf2"),
                ("lwjgl.dll", b"pe"),
            ],
        );

        let out = dir.path().join("natives");
        let mut names = extract_matching(&jar, &out, ".so").await.unwrap();
        names.sort();

        assert_eq!(names, vec!["libglfw.so", "liblwjgl.so"]);
        assert_eq!(std::fs::read(out.join("libglfw.so")).unwrap(), b"elf2");
        assert!(!out.join("lwjgl.dll").exists());
        assert!(!out.join("libsigned.so").exists());
    }

    #[tokio::test]
    async fn corrupt_bundle_fails() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("broken.jar");
        std::fs::write(&jar, b"not a zip").unwrap();

        let err = extract_matching(&jar, &dir.path().join("natives"), ".so")
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Zip(_)));
    }

    #[tokio::test]
    async fn stripping_root_drops_the_top_level_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("overlay.zip");
        write_zip(
            &archive,
            &[
                ("patch-main/", b""),
                ("patch-main/README.md", b"readme"),
                ("patch-main/libraries/", b""),
                ("patch-main/libraries/lwjgl.jar", b"jar"),
                ("patch-main/natives/liblwjgl.dylib", b"macho"),
            ],
        );

        let out = dir.path().join("overlay");
        let written = extract_stripping_root(&archive, &out).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(std::fs::read(out.join("libraries/lwjgl.jar")).unwrap(), b"jar");
        assert!(out.join("natives/liblwjgl.dylib").is_file());
        assert!(!out.join("patch-main").exists());
    }
}
