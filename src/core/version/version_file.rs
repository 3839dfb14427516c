// ─── Version File ───
// The resolved descriptor of one instance: libraries, main class, argument templates.

use std::collections::HashMap;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::rules::{self, Platform, Rule};
use crate::core::error::{LauncherError, LauncherResult};

/// A fully parsed version descriptor.
///
/// Fields we do not model are kept in `extra` so rewriting the descriptor
/// after a loader merge does not lose upstream data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: String,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<VersionDownloads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<JavaVersionInfo>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub version_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    pub major_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<DownloadArtifact>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<ArgumentElement>,
    #[serde(default)]
    pub jvm: Vec<ArgumentElement>,
}

/// One entry of an argument template list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentElement {
    Literal(String),
    Conditional {
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    One(String),
    Many(Vec<String>),
}

impl ArgumentElement {
    /// The strings this element contributes on `platform`, if any.
    pub fn values_for(&self, platform: &Platform) -> Vec<String> {
        match self {
            ArgumentElement::Literal(arg) => vec![arg.clone()],
            ArgumentElement::Conditional { rules, value } => {
                if !rules::evaluate(rules, platform) {
                    return vec![];
                }
                match value {
                    ArgumentValue::One(arg) => vec![arg.clone()],
                    ArgumentValue::Many(args) => args.clone(),
                }
            }
        }
    }
}

// ─── Libraries ───

/// A library is either a direct platform artifact (explicit URL, hash and
/// path) or a repository coordinate whose location is derived from
/// `group:artifact:version`. The presence of `downloads` decides which.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Library {
    Platform(PlatformArtifact),
    Coordinate(CoordinateArtifact),
}

impl<'de> Deserialize<'de> for Library {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let is_platform = value
            .as_object()
            .ok_or_else(|| D::Error::custom("library entry must be an object"))?
            .contains_key("downloads");

        if is_platform {
            serde_json::from_value(value)
                .map(Library::Platform)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Library::Coordinate)
                .map_err(D::Error::custom)
        }
    }
}

impl Library {
    pub fn name(&self) -> &str {
        match self {
            Library::Platform(lib) => &lib.name,
            Library::Coordinate(lib) => &lib.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformArtifact {
    pub name: String,
    pub downloads: LibraryDownloads,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    /// OS name -> classifier key (may contain `${arch}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natives: Option<HashMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifiers: Option<HashMap<String, LibDownloadArtifact>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateArtifact {
    pub name: String,
    /// Root URL of the Maven repository hosting the artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CoordinateArtifact {
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(repository.into()),
            extra: Map::new(),
        }
    }
}

impl PlatformArtifact {
    pub fn is_allowed_on(&self, platform: &Platform) -> bool {
        match &self.rules {
            Some(rules) => rules::evaluate(rules, platform),
            None => true,
        }
    }

    /// Native bundles applicable on `platform`, `${arch}` already substituted.
    pub fn native_bundles_for(&self, platform: &Platform) -> Vec<&LibDownloadArtifact> {
        let (Some(natives), Some(classifiers)) = (&self.natives, &self.downloads.classifiers)
        else {
            return vec![];
        };

        rules::parse_natives_map(natives)
            .into_iter()
            .filter(|(os, _)| platform.matches_os(*os))
            .filter_map(|(_, classifier)| {
                let key = classifier.replace("${arch}", platform.arch.bitness());
                classifiers.get(&key)
            })
            .collect()
    }
}

impl VersionJson {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read a persisted descriptor.
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        Self::parse(&raw)
    }

    /// Overwrite the descriptor file wholesale.
    pub async fn save(&self, path: &Path) -> LauncherResult<()> {
        let json = serde_json::to_vec(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| LauncherError::io(path, e))
    }

    /// Asset index name used by `${assets_index_name}`.
    pub fn asset_index_name(&self) -> String {
        self.assets
            .clone()
            .or_else(|| self.asset_index.as_ref().map(|ai| ai.id.clone()))
            .unwrap_or_else(|| "legacy".to_string())
    }

    pub fn required_java_major(&self) -> u32 {
        self.java_version
            .as_ref()
            .map(|j| j.major_version)
            .unwrap_or(17)
    }

    /// JVM argument templates, synthesised for legacy descriptors.
    pub fn jvm_templates(&self) -> Vec<ArgumentElement> {
        match &self.arguments {
            Some(args) => args.jvm.clone(),
            None => ["-Djava.library.path=${natives_directory}", "-cp", "${classpath}"]
                .into_iter()
                .map(|arg| ArgumentElement::Literal(arg.to_string()))
                .collect(),
        }
    }

    /// Game argument templates; legacy descriptors split `minecraftArguments`.
    pub fn game_templates(&self) -> Vec<ArgumentElement> {
        match (&self.arguments, &self.minecraft_arguments) {
            (Some(args), _) => args.game.clone(),
            (None, Some(legacy)) => legacy
                .split_whitespace()
                .map(|arg| ArgumentElement::Literal(arg.to_string()))
                .collect(),
            (None, None) => vec![],
        }
    }
}
