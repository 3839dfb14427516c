pub mod manifest;
pub mod rules;
pub mod version_file;

pub use manifest::{VersionEntry, VersionManifest, VERSION_MANIFEST_URL};
pub use rules::{evaluate, Arch, OsName, Platform, Rule, RuleAction};
pub use version_file::{
    ArgumentElement, CoordinateArtifact, LibDownloadArtifact, Library, PlatformArtifact,
    VersionJson,
};
