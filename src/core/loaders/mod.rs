pub mod context;
pub mod fabric;
pub mod installer;
pub mod vanilla;

pub use context::InstallContext;
pub use installer::{Installer, LoaderInstaller};
