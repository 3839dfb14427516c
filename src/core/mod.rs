// ─── Spectral Core ───
// Install pipeline and launch assembly for Minecraft instances.
//
// Architecture:
//   core/
//     version/     Version index, descriptors, platform rules
//     libraries/   Library resolution, natives, platform overlay
//     maven/       Repository coordinates
//     downloader/  Content-addressed fetcher with bounded retry
//     assets/      Asset index + object planning
//     loaders/     Vanilla, Fabric descriptor merge
//     instance/    Instance layout + persisted config
//     launch/      Argument templates, classpath checks, spawner
//     java/        Java binary lookup
//     state/       Paths, settings, shared clients
//     install.rs   The install pipeline
//     pool.rs      Bounded worker pool with phase barriers

pub mod archive;
pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod instance;
pub mod java;
pub mod launch;
pub mod libraries;
pub mod loaders;
pub mod maven;
pub mod pool;
pub mod state;
pub mod version;
