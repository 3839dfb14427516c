pub mod manager;
pub mod model;

pub use manager::InstanceManager;
pub use model::{validate_instance_name, Instance, InstanceConfig, LoaderType};
