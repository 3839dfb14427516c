// ─── Argument Templates ───
// Rule-gated argument lists plus `${token}` substitution from one value record.

use tracing::warn;

use crate::core::auth::LaunchAccountProfile;
use crate::core::version::{ArgumentElement, Platform, VersionJson};

/// Every value a template may reference, materialised before substitution.
#[derive(Debug, Clone)]
pub struct RuntimeValues {
    pub natives_directory: String,
    pub classpath: String,
    pub classpath_separator: &'static str,
    pub primary_jar: String,
    pub library_directory: String,
    pub game_directory: String,
    pub assets_root: String,
    pub assets_index_name: String,
    pub version_name: String,
    pub version_type: String,
    pub launcher_name: &'static str,
    pub launcher_version: &'static str,
    pub account: LaunchAccountProfile,
}

struct Placeholder {
    token: &'static str,
    value: fn(&RuntimeValues) -> &str,
}

const JVM_PLACEHOLDERS: &[Placeholder] = &[
    Placeholder { token: "natives_directory", value: |v| &v.natives_directory },
    Placeholder { token: "launcher_name", value: |v| v.launcher_name },
    Placeholder { token: "launcher_version", value: |v| v.launcher_version },
    Placeholder { token: "classpath", value: |v| &v.classpath },
    Placeholder { token: "primary_jar", value: |v| &v.primary_jar },
    Placeholder { token: "classpath_separator", value: |v| v.classpath_separator },
    Placeholder { token: "library_directory", value: |v| &v.library_directory },
    Placeholder { token: "game_directory", value: |v| &v.game_directory },
    Placeholder { token: "version_name", value: |v| &v.version_name },
];

const GAME_PLACEHOLDERS: &[Placeholder] = &[
    Placeholder { token: "auth_player_name", value: |v| &v.account.username },
    Placeholder { token: "version_name", value: |v| &v.version_name },
    Placeholder { token: "game_directory", value: |v| &v.game_directory },
    Placeholder { token: "assets_root", value: |v| &v.assets_root },
    Placeholder { token: "game_assets", value: |v| &v.assets_root },
    Placeholder { token: "assets_index_name", value: |v| &v.assets_index_name },
    Placeholder { token: "auth_uuid", value: |v| &v.account.uuid },
    Placeholder { token: "auth_access_token", value: |v| &v.account.access_token },
    Placeholder { token: "auth_session", value: |v| &v.account.access_token },
    Placeholder { token: "auth_xuid", value: |v| &v.account.xuid },
    Placeholder { token: "clientid", value: |v| &v.account.client_id },
    Placeholder { token: "user_type", value: |v| &v.account.user_type },
    Placeholder { token: "user_properties", value: |_| "{}" },
    Placeholder { token: "version_type", value: |v| &v.version_type },
];

/// Replace every `${token}` in `template` in a single left-to-right scan.
/// Substituted text is never rescanned. `None` if any token is unknown.
fn substitute(template: &str, table: &[Placeholder], values: &RuntimeValues) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}')?;
        let token = &after[..end];

        let placeholder = table.iter().find(|p| p.token == token)?;
        out.push_str((placeholder.value)(values));
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Some(out)
}

/// Drop an option flag left without its value. A dropped argument that is
/// itself an option owns no preceding flag.
fn drop_dangling_option(args: &mut Vec<String>, dropped: &str) {
    if dropped.starts_with('-') {
        return;
    }
    if args.last().is_some_and(|last| last.starts_with('-')) {
        let _ = args.pop();
    }
}

fn expand(
    elements: &[ArgumentElement],
    platform: &Platform,
    table: &[Placeholder],
    values: &RuntimeValues,
) -> Vec<String> {
    let gated: Vec<String> = elements
        .iter()
        .flat_map(|element| element.values_for(platform))
        .collect();

    let mut resolved = Vec::with_capacity(gated.len());
    for arg in gated {
        match substitute(&arg, table, values) {
            Some(value) => resolved.push(value),
            None => {
                warn!("Dropping argument with unresolved placeholder: {}", arg);
                drop_dangling_option(&mut resolved, &arg);
            }
        }
    }
    resolved
}

pub fn jvm_arguments(
    descriptor: &VersionJson,
    platform: &Platform,
    values: &RuntimeValues,
) -> Vec<String> {
    expand(&descriptor.jvm_templates(), platform, JVM_PLACEHOLDERS, values)
}

pub fn game_arguments(
    descriptor: &VersionJson,
    platform: &Platform,
    values: &RuntimeValues,
) -> Vec<String> {
    expand(&descriptor.game_templates(), platform, GAME_PLACEHOLDERS, values)
}

/// Fixed JVM flags placed before the descriptor's own.
pub fn jvm_preamble(values: &RuntimeValues, max_memory_mb: u32, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        format!("-Xmx{}M", max_memory_mb),
        format!("-Dminecraft.client.jar={}", values.primary_jar),
    ];
    args.extend(
        [
            "-XX:+UnlockExperimentalVMOptions",
            "-XX:+UseG1GC",
            "-XX:G1NewSizePercent=20",
            "-XX:G1ReservePercent=20",
            "-XX:MaxGCPauseMillis=50",
            "-XX:G1HeapRegionSize=16m",
            "-XX:-UseAdaptiveSizePolicy",
            "-XX:-OmitStackTraceInFastThrow",
            "-XX:-DontCompileHugeMethods",
            "-Dfml.ignoreInvalidMinecraftCertificates=true",
            "-Dfml.ignorePatchDiscrepancies=true",
            "-Djava.rmi.server.useCodebaseOnly=true",
            "-Dcom.sun.jndi.rmi.object.trustURLCodebase=false",
            "-Dcom.sun.jndi.cosnaming.object.trustURLCodebase=false",
            "-Dlog4j2.formatMsgNoLookups=true",
        ]
        .map(String::from),
    );
    args.extend(extra.iter().cloned());
    args
}

/// `[preamble, jvm args, main class, game args]`
pub fn build_launch_arguments(
    descriptor: &VersionJson,
    platform: &Platform,
    values: &RuntimeValues,
    preamble: Vec<String>,
) -> Vec<String> {
    let mut argv = preamble;
    argv.extend(jvm_arguments(descriptor, platform, values));
    argv.push(descriptor.main_class.clone());
    argv.extend(game_arguments(descriptor, platform, values));
    argv
}
