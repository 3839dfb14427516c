pub mod arguments;
pub mod classpath;
pub mod task;

pub use arguments::{build_launch_arguments, game_arguments, jvm_arguments, RuntimeValues};
pub use task::{launch, prepare_launch, spawn_detached, LaunchPlan};
