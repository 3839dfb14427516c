pub mod runtime;

pub use runtime::resolve_java_binary;
