use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // ── Resolution ──────────────────────────────────────
    #[error("Version {0} not found in the version index")]
    VersionNotFound(String),

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Launch ──────────────────────────────────────────
    #[error("Missing dependency: {0:?}")]
    MissingDependency(PathBuf),

    #[error("No Java runtime found under {0:?}")]
    JavaNotFound(PathBuf),

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Instance ────────────────────────────────────────
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Invalid instance name: {0:?}")]
    InvalidInstanceName(String),

    // ── Loader ──────────────────────────────────────────
    #[error("Loader API unreachable: {0}")]
    LoaderApi(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Wrap an IO error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// Failures a fresh attempt can plausibly fix: network, disk and
    /// content-integrity errors. Everything else aborts immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LauncherError::Io { .. }
                | LauncherError::Http(_)
                | LauncherError::DownloadFailed { .. }
                | LauncherError::HashMismatch { .. }
        )
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_and_io_failures_are_transient() {
        let mismatch = LauncherError::HashMismatch {
            url: "https://x/a.jar".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let io = LauncherError::io("/tmp/x", std::io::Error::other("disk"));
        assert!(mismatch.is_transient());
        assert!(io.is_transient());
    }

    #[test]
    fn resolution_failures_are_not_retried() {
        assert!(!LauncherError::VersionNotFound("99.99".into()).is_transient());
        assert!(!LauncherError::MissingDependency("/x.jar".into()).is_transient());
    }

    #[test]
    fn hash_mismatch_message_names_both_values() {
        let err = LauncherError::HashMismatch {
            url: "https://x/a.jar".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aa") && msg.contains("bb") && msg.contains("https://x/a.jar"));
    }
}
