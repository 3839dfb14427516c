pub mod commands;
pub mod core;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::LaunchOutcome;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstallRequest;
use crate::core::state::{AppState, LauncherPaths};

#[derive(Parser)]
#[command(name = "spectral", version, about = "Install and launch Minecraft instances")]
struct Cli {
    /// Override the user-data root (instances, libraries, assets)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List release versions from the remote index
    Versions,
    /// Install (or reinstall) an instance
    Install {
        name: String,
        /// Game version id, e.g. 1.20.4
        version: String,
        /// Fabric loader version; omit for vanilla
        #[arg(long, value_name = "LOADER_VERSION")]
        loader: Option<String>,
        /// Apply the platform compatibility overlay
        #[arg(long)]
        overlay: bool,
    },
    /// Launch an installed instance
    Launch {
        name: String,
        /// Print the command line instead of spawning
        #[arg(long)]
        dry_run: bool,
    },
    /// List installed instances
    List,
}

pub fn run() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,spectral_lib=debug")),
        )
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Could not start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> LauncherResult<()> {
    let mut paths = LauncherPaths::platform_default();
    if let Some(data_dir) = cli.data_dir {
        paths = paths.with_data_dir(data_dir);
    }
    paths.ensure_roots().await?;

    let first_run = !paths.settings_path().exists();
    let state = AppState::new(paths)?;
    if first_run {
        if let Err(e) = state.save_settings() {
            warn!("Could not write default settings: {}", e);
        }
    }

    match cli.command {
        Command::Versions => {
            for version in commands::get_minecraft_versions(&state).await? {
                let marker = if version.latest { " (latest)" } else { "" };
                println!("{}{}", version.id, marker);
            }
        }
        Command::Install {
            name,
            version,
            loader,
            overlay,
        } => {
            let info = commands::create_instance(
                &state,
                InstallRequest {
                    name,
                    minecraft_version: version,
                    loader_version: loader,
                    overlay,
                },
            )
            .await?;
            println!("Installed '{}' at {}", info.name, info.path);
        }
        Command::Launch { name, dry_run } => {
            match commands::launch_instance(&state, &name, dry_run).await? {
                LaunchOutcome::DryRun(line) => println!("{}", line),
                LaunchOutcome::Spawned { pid } => println!("Started '{}' (pid {})", name, pid),
            }
        }
        Command::List => {
            let instances = commands::list_instances(&state).await?;
            let json = serde_json::to_string_pretty(&instances).map_err(LauncherError::from)?;
            println!("{}", json);
        }
    }

    Ok(())
}
