pub mod host;

pub use host::{HostAdapter, HostConfig};
