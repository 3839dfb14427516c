use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

pub const CONFIG_FILE: &str = "spectralconfig.json";

/// Supported mod loaders.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    #[default]
    Vanilla,
    Fabric,
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderType::Vanilla => write!(f, "vanilla"),
            LoaderType::Fabric => write!(f, "fabric"),
        }
    }
}

/// Per-instance flags persisted as `spectralconfig.json`.
///
/// Every field is defaulted so files written by older builds (which only
/// carried `usingOverlay`) still parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceConfig {
    pub using_overlay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minecraft_version: Option<String>,
    pub loader: LoaderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

/// A named installation root: `instances/<name>/`.
///
/// ```text
/// <name>/
///   spectralconfig.json
///   versions/default/
///     default.json   resolved descriptor
///     default.jar    client artifact
///     natives/       extracted shared libraries
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub root: PathBuf,
}

impl Instance {
    pub fn new(instances_dir: &Path, name: &str) -> LauncherResult<Self> {
        validate_instance_name(name)?;
        Ok(Self {
            name: name.to_string(),
            root: instances_dir.join(name),
        })
    }

    pub fn version_dir(&self) -> PathBuf {
        self.root.join("versions").join("default")
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.version_dir().join("default.json")
    }

    pub fn client_jar_path(&self) -> PathBuf {
        self.version_dir().join("default.jar")
    }

    pub fn natives_dir(&self) -> PathBuf {
        self.version_dir().join("natives")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}

/// Names map 1:1 to directories, so anything that could escape
/// `instances/` is rejected.
pub fn validate_instance_name(name: &str) -> LauncherResult<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        Err(LauncherError::InvalidInstanceName(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_follows_instance_root() {
        let instance = Instance::new(Path::new("/data/instances"), "survival").unwrap();
        assert_eq!(
            instance.descriptor_path(),
            PathBuf::from("/data/instances/survival/versions/default/default.json")
        );
        assert_eq!(
            instance.client_jar_path(),
            PathBuf::from("/data/instances/survival/versions/default/default.jar")
        );
        assert_eq!(
            instance.config_path(),
            PathBuf::from("/data/instances/survival/spectralconfig.json")
        );
    }

    #[test]
    fn path_like_names_are_rejected() {
        for bad in ["", "  ", ".", "..", "a/b", "a\\b"] {
            assert!(
                matches!(validate_instance_name(bad), Err(LauncherError::InvalidInstanceName(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_instance_name("My Pack 1.20").is_ok());
    }

    #[test]
    fn legacy_config_parses_with_defaults() {
        let config: InstanceConfig = serde_json::from_str(r#"{"usingOverlay":true}"#).unwrap();
        assert!(config.using_overlay);
        assert_eq!(config.loader, LoaderType::Vanilla);
        assert!(config.installed_at.is_none());
    }

    #[test]
    fn config_serializes_camel_case() {
        let config = InstanceConfig {
            using_overlay: false,
            minecraft_version: Some("1.20.4".into()),
            loader: LoaderType::Fabric,
            loader_version: Some("0.15.6".into()),
            installed_at: None,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["usingOverlay"], false);
        assert_eq!(value["minecraftVersion"], "1.20.4");
        assert_eq!(value["loader"], "fabric");
        assert_eq!(value["loaderVersion"], "0.15.6");
        assert!(value.get("installedAt").is_none());
    }
}
