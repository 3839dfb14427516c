mod app_state;
mod paths;

pub use app_state::{AppState, Endpoints, LauncherSettings};
pub use paths::LauncherPaths;
