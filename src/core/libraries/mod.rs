mod overlay;
mod resolver;

pub use overlay::{install_overlay, overlay_libraries, overlay_natives_dir};
pub use resolver::{
    library_classpath, resolve_libraries, FetchTask, ResolveContext, ResolvedLibraries,
    OVERLAY_SUPERSEDED,
};
