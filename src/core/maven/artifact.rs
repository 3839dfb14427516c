use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::core::error::{LauncherError, LauncherResult};

/// A parsed repository coordinate.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:version[:classifier]@extension`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub extension: String,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let (coord_part, extension) = match coord.rsplit_once('@') {
            Some((head, ext)) if !ext.is_empty() => (head, ext),
            _ => (coord, "jar"),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        };

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    /// `artifactId-version[-classifier].extension`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Full URL of this artifact under `repo_base`.
    ///
    /// `<repo>/<group as path>/<artifact>/<version>/<filename>`, with every
    /// segment percent-encoded.
    pub fn url(&self, repo_base: &str) -> LauncherResult<String> {
        let mut url = Url::parse(repo_base).map_err(|e| {
            LauncherError::Other(format!("Invalid repository URL {}: {}", repo_base, e))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                LauncherError::Other(format!("Repository URL cannot be a base: {}", repo_base))
            })?;
            segments
                .pop_if_empty()
                .extend(self.group_id.split('.'))
                .push(&self.artifact_id)
                .push(&self.version)
                .push(&self.filename());
        }

        Ok(url.into())
    }

    /// Path relative to the libraries root, Maven local-repo layout.
    ///
    /// Both the fetch destination and the launch classpath derive from this,
    /// so the two can never disagree.
    pub fn local_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group_id.split('.').collect();
        path.push(&self.artifact_id);
        path.push(&self.version);
        path.push(self.filename());
        path
    }

    pub fn local_file(&self, libraries_root: &Path) -> PathBuf {
        libraries_root.join(self.local_path())
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}
