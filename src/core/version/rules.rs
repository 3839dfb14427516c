// ─── Platform Rules ───
// Allow/disallow predicates attached to libraries and launch arguments.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Operating-system family as it appears in upstream metadata.
///
/// Upstream spells macOS both `osx` and `macos`; both collapse onto
/// [`OsName::Osx`] here, before any comparison runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsName {
    Windows,
    Osx,
    Linux,
    /// Anything we do not recognise. Never equal to the host platform.
    Other,
}

impl OsName {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "windows" => OsName::Windows,
            "osx" | "macos" => OsName::Osx,
            "linux" => OsName::Linux,
            _ => OsName::Other,
        }
    }

    /// Canonical upstream spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsName::Windows => "windows",
            OsName::Osx => "osx",
            OsName::Linux => "linux",
            OsName::Other => "unknown",
        }
    }

    /// File suffix of shared libraries on this OS.
    pub fn native_suffix(&self) -> &'static str {
        match self {
            OsName::Windows => ".dll",
            OsName::Osx => ".dylib",
            _ => ".so",
        }
    }
}

impl<'de> Deserialize<'de> for OsName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OsName::parse(&raw))
    }
}

impl Serialize for OsName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// CPU architecture as named in rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    X86,
    Arm64,
    #[serde(other)]
    Other,
}

impl Arch {
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "x86" => Arch::X86,
            "aarch64" => Arch::Arm64,
            _ => Arch::Other,
        }
    }

    /// Value substituted for `${arch}` in native classifier names.
    pub fn bitness(&self) -> &'static str {
        match self {
            Arch::X86 => "32",
            _ => "64",
        }
    }
}

/// The only architecture an `os.arch` condition is ever matched against.
const EVALUATED_ARCH: Arch = Arch::X64;

/// The platform rules are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: OsName,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: OsName, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The host this process runs on. Unknown systems are treated as Linux.
    pub fn current() -> Self {
        let os = if cfg!(target_os = "windows") {
            OsName::Windows
        } else if cfg!(target_os = "macos") {
            OsName::Osx
        } else {
            OsName::Linux
        };
        Self::new(os, Arch::current())
    }

    pub fn matches_os(&self, os: OsName) -> bool {
        os != OsName::Other && os == self.os
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<OsName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Arch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
    /// Feature flags (`is_demo_user`, `has_custom_resolution`, ...).
    /// Parsed and kept, never evaluated: a feature-only rule matches nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<HashMap<String, bool>>,
}

impl Rule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            os: None,
            features: None,
        }
    }

    pub fn disallow() -> Self {
        Self {
            action: RuleAction::Disallow,
            ..Self::allow()
        }
    }

    pub fn for_os(mut self, os: OsName) -> Self {
        self.os.get_or_insert_with(OsRule::default).name = Some(os);
        self
    }

    pub fn for_arch(mut self, arch: Arch) -> Self {
        self.os.get_or_insert_with(OsRule::default).arch = Some(arch);
        self
    }

    pub fn with_feature(mut self, feature: &str) -> Self {
        self.features
            .get_or_insert_with(HashMap::new)
            .insert(feature.to_string(), true);
        self
    }
}

/// Evaluate an ordered rule list against `platform`.
///
/// Every condition that matches ANDs `action == allow` into the result, so
/// two allow rules matching different conditions must both hold. A rule
/// with neither an OS nor a feature constraint counts as a match but leaves
/// the result untouched, whatever its action. If nothing matched at all the
/// answer is `false`.
pub fn evaluate(rules: &[Rule], platform: &Platform) -> bool {
    let mut matched_any = false;
    let mut result = true;

    for rule in rules {
        let allows = rule.action == RuleAction::Allow;

        match (&rule.os, &rule.features) {
            (Some(os), _) => {
                if let Some(name) = os.name {
                    if platform.matches_os(name) {
                        result = result && allows;
                        matched_any = true;
                    }
                }
                if os.arch == Some(EVALUATED_ARCH) && platform.arch == EVALUATED_ARCH {
                    result = result && allows;
                    matched_any = true;
                }
            }
            // Feature gates are recognised but never satisfied.
            (None, Some(_)) => {}
            (None, None) => matched_any = true,
        }
    }

    matched_any && result
}

/// Parse an upstream `natives` map, normalising its OS keys.
pub fn parse_natives_map(raw: &HashMap<String, String>) -> Vec<(OsName, String)> {
    let mut parsed: Vec<(OsName, String)> = raw
        .iter()
        .map(|(os, classifier)| (OsName::parse(os), classifier.clone()))
        .collect();
    parsed.sort_by(|a, b| a.1.cmp(&b.1));
    parsed
}
