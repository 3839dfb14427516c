// ─── Launch Task ───
// Rebuilds the classpath of an installed instance, verifies it, renders the
// argument templates and spawns the game detached.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

#[cfg(unix)]
use std::os::unix::process::CommandExt;
#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tracing::{debug, info};

use crate::core::auth::LaunchAccountProfile;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{APP_NAME, APP_VERSION};
use crate::core::instance::InstanceManager;
use crate::core::java::resolve_java_binary;
use crate::core::libraries::{library_classpath, overlay_libraries, overlay_natives_dir, ResolveContext};
use crate::core::state::AppState;
use crate::core::version::{Platform, VersionJson};

use super::arguments::{build_launch_arguments, jvm_preamble, RuntimeValues};
use super::classpath::{
    assemble_classpath, canonical_path, get_classpath_separator, join_classpath, path_text,
    safe_path_str, verify_present,
};

/// Everything needed to start the game, fully rendered.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub java: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub natives_dir: PathBuf,
}

impl LaunchPlan {
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.args(&self.args).current_dir(&self.working_dir);
        configure_native_library_env(&mut cmd, &self.natives_dir);
        cmd
    }

    /// Copy/paste-able rendering of the command.
    pub fn command_line(&self) -> String {
        format_command_for_logs(&self.command())
    }
}

/// Resolve → verify → substitute for the instance `name`. Nothing is spawned.
pub async fn prepare_launch(state: &AppState, name: &str) -> LauncherResult<LaunchPlan> {
    let started = Instant::now();
    let paths = &state.paths;
    let settings = &state.settings;
    let manager = InstanceManager::new(paths.instances_dir());

    let instance = manager.open(name).await?;
    let config = manager.read_config(&instance).await?;
    let descriptor = VersionJson::load(&instance.descriptor_path()).await?;
    let platform = Platform::current();

    // 1. Classpath entries and natives location
    let ctx = ResolveContext {
        platform,
        libraries_dir: paths.libraries_dir(),
        natives_dir: instance.natives_dir(),
        temp_dir: paths.temp_dir().to_path_buf(),
        default_repository: settings.endpoints.loader_maven_url.clone(),
        overlay_active: config.using_overlay,
    };
    let libraries = library_classpath(&descriptor.libraries, &ctx)?;

    let overlay_dir = paths.overlay_dir();
    let (overlay, natives_dir) = if config.using_overlay {
        (overlay_libraries(&overlay_dir).await?, overlay_natives_dir(&overlay_dir))
    } else {
        (Vec::new(), instance.natives_dir())
    };

    let client_jar = instance.client_jar_path();
    let entries = assemble_classpath(overlay, libraries, client_jar.clone());
    let java = resolve_java_binary(settings.java_path.as_deref(), &paths.jres_dir()).await?;
    debug!(
        "{} expects Java {}, using {:?}",
        descriptor.id,
        descriptor.required_java_major(),
        java
    );

    // 2. Verify before anything is rendered
    let mut required = entries.clone();
    required.push(java.clone());
    let mut verified = verify_present(&state.pool, &required).await?;
    verified.truncate(entries.len());

    // 3. Substitute
    let natives_dir = canonical_path(&natives_dir).await;
    let values = RuntimeValues {
        natives_directory: path_text(&natives_dir),
        classpath: join_classpath(&verified),
        classpath_separator: get_classpath_separator(),
        primary_jar: safe_path_str(&client_jar).await,
        library_directory: safe_path_str(&paths.libraries_dir()).await,
        game_directory: safe_path_str(&instance.root).await,
        assets_root: safe_path_str(&paths.assets_dir()).await,
        assets_index_name: descriptor.asset_index_name(),
        version_name: descriptor.id.clone(),
        version_type: descriptor
            .version_type
            .clone()
            .unwrap_or_else(|| "release".to_string()),
        launcher_name: APP_NAME,
        launcher_version: APP_VERSION,
        account: LaunchAccountProfile::offline(&settings.username),
    };
    let preamble = jvm_preamble(&values, settings.max_memory_mb, &settings.extra_jvm_args);
    let args = build_launch_arguments(&descriptor, &platform, &values, preamble);

    info!(
        "Prepared launch of '{}' ({} entries on classpath) in {:.2?}",
        instance.name,
        entries.len(),
        started.elapsed()
    );

    Ok(LaunchPlan {
        java,
        args,
        working_dir: instance.root,
        natives_dir,
    })
}

/// Start the game and let it run on its own. Only the pid is kept.
pub fn spawn_detached(plan: &LaunchPlan) -> LauncherResult<u32> {
    let mut cmd = plan.command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    configure_platform_spawn(&mut cmd);

    info!("Launching with Java: {:?}", plan.java);
    debug!("Command (copy/paste): {}", format_command_for_logs(&cmd));

    let child = cmd
        .spawn()
        .map_err(|e| LauncherError::JavaExecution(e.to_string()))?;
    let pid = child.id();
    info!("Game process started with pid {}", pid);
    Ok(pid)
}

pub async fn launch(state: &AppState, name: &str) -> LauncherResult<u32> {
    let plan = prepare_launch(state, name).await?;
    spawn_detached(&plan)
}

fn configure_native_library_env(cmd: &mut Command, natives_dir: &Path) {
    let native_path = path_text(natives_dir);

    if cfg!(target_os = "windows") {
        cmd.env("PATH", append_env_path("PATH", &native_path));
    } else if cfg!(target_os = "macos") {
        cmd.env("DYLD_LIBRARY_PATH", append_env_path("DYLD_LIBRARY_PATH", &native_path));
    } else {
        cmd.env("LD_LIBRARY_PATH", append_env_path("LD_LIBRARY_PATH", &native_path));
    }
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    #[cfg(target_os = "windows")]
    {
        const DETACHED_PROCESS: u32 = 0x00000008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }
}

fn append_env_path(var_name: &str, value: &str) -> String {
    let separator = get_classpath_separator();
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}

fn format_command_for_logs(cmd: &Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::install::tests::{fake_upstream, state_for};
    use crate::core::install::{install, InstallRequest};

    fn request(name: &str, overlay: bool) -> InstallRequest {
        InstallRequest {
            name: name.into(),
            minecraft_version: "1.20.4".into(),
            loader_version: None,
            overlay,
        }
    }

    fn fake_java(jres_dir: &Path) -> PathBuf {
        let exe = if cfg!(windows) { "java.exe" } else { "java" };
        let java = jres_dir.join("test-jre/bin").join(exe);
        std::fs::create_dir_all(java.parent().unwrap()).unwrap();
        std::fs::write(&java, b"#!/bin/sh\nexit 0\n").unwrap();
        java
    }

    #[test]
    fn env_path_is_prefixed() {
        std::env::set_var("SPECTRAL_TEST_PATH", "/usr/lib");
        let sep = get_classpath_separator();
        assert_eq!(
            append_env_path("SPECTRAL_TEST_PATH", "/natives"),
            format!("/natives{sep}/usr/lib")
        );
        assert_eq!(append_env_path("SPECTRAL_TEST_UNSET_PATH", "/natives"), "/natives");
    }

    #[test]
    fn shell_escape_quotes_only_when_needed() {
        assert_eq!(shell_escape("-Xmx2048M"), "-Xmx2048M");
        assert_eq!(shell_escape("a b"), "\"a b\"");
        assert_eq!(shell_escape(""), "\"\"");
    }

    #[tokio::test]
    async fn dry_run_renders_full_argv() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_upstream(dir.path()).await;
        let state = state_for(dir.path(), &server);
        install(&state, &request("play", false)).await.unwrap();
        fake_java(&state.paths.jres_dir());

        let plan = prepare_launch(&state, "play").await.unwrap();
        let instance = InstanceManager::new(state.paths.instances_dir())
            .instance("play")
            .unwrap();

        assert!(plan.java.starts_with(state.paths.jres_dir()));
        assert_eq!(plan.working_dir, instance.root);
        assert_eq!(plan.args[0], "-Xmx2048M");

        let main = plan
            .args
            .iter()
            .position(|a| a == "net.minecraft.client.main.Main")
            .unwrap();
        let cp = &plan.args[main - 1];
        assert_eq!(plan.args[main - 2], "-cp");
        assert!(cp.contains("brigadier-1.1.8.jar"));
        assert!(cp.contains("lwjgl-3.3.1.jar"));
        assert!(cp.ends_with("default.jar"));
        assert!(plan.args.contains(&format!(
            "-Djava.library.path={}",
            safe_path_str(&instance.natives_dir()).await
        )));

        let game = &plan.args[main + 1..];
        assert_eq!(&game[..4], &["--username", "Player", "--version", "1.20.4"]);
        assert!(game.contains(&"12".to_string()));
        assert!(!game.contains(&"--demo".to_string()));
        assert!(!plan.args.iter().any(|a| a.contains("${")));
        assert!(plan.command_line().contains("net.minecraft.client.main.Main"));
    }

    #[tokio::test]
    async fn missing_library_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_upstream(dir.path()).await;
        let state = state_for(dir.path(), &server);
        install(&state, &request("broken", false)).await.unwrap();
        fake_java(&state.paths.jres_dir());

        let jar = state
            .paths
            .libraries_dir()
            .join("com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar");
        std::fs::remove_file(&jar).unwrap();

        let err = prepare_launch(&state, "broken").await.unwrap_err();
        assert!(matches!(err, LauncherError::MissingDependency(ref p) if *p == jar));
    }

    #[tokio::test]
    async fn configured_java_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_upstream(dir.path()).await;
        let mut state = state_for(dir.path(), &server);
        install(&state, &request("nojava", false)).await.unwrap();

        let java = dir.path().join("missing/bin/java");
        state.settings.java_path = Some(java.clone());

        let err = prepare_launch(&state, "nojava").await.unwrap_err();
        assert!(matches!(err, LauncherError::MissingDependency(ref p) if *p == java));
    }

    #[tokio::test]
    async fn no_runtime_at_all() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_upstream(dir.path()).await;
        let state = state_for(dir.path(), &server);
        install(&state, &request("bare", false)).await.unwrap();

        let err = prepare_launch(&state, "bare").await.unwrap_err();
        assert!(matches!(err, LauncherError::JavaNotFound(_)));
    }

    #[tokio::test]
    async fn overlay_libraries_lead_the_classpath() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_upstream(dir.path()).await;
        let state = state_for(dir.path(), &server);
        install(&state, &request("patched", true)).await.unwrap();
        fake_java(&state.paths.jres_dir());

        let plan = prepare_launch(&state, "patched").await.unwrap();
        let cp_index = plan.args.iter().position(|a| a == "-cp").unwrap() + 1;
        let cp = &plan.args[cp_index];

        let overlay_jar = state.paths.overlay_dir().join("libraries/lwjgl-arm64.jar");
        assert!(cp.starts_with(&safe_path_str(&overlay_jar).await));
        assert!(!cp.contains("lwjgl-3.3.1.jar"));
        assert_eq!(
            plan.natives_dir,
            canonical_path(&overlay_natives_dir(&state.paths.overlay_dir())).await
        );
    }

    #[tokio::test]
    async fn uninstalled_instance_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_upstream(dir.path()).await;
        let state = state_for(dir.path(), &server);

        let err = prepare_launch(&state, "ghost").await.unwrap_err();
        assert!(matches!(err, LauncherError::InstanceNotFound(ref n) if n == "ghost"));
    }

    #[cfg(unix)]
    #[test]
    fn spawn_reports_a_pid() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let java = fake_java(dir.path());
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();

        let plan = LaunchPlan {
            java,
            args: vec!["-version".into()],
            working_dir: dir.path().to_path_buf(),
            natives_dir: dir.path().join("natives"),
        };
        assert!(spawn_detached(&plan).unwrap() > 0);
    }
}
