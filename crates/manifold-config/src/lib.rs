//! KDL configuration parsing for Manifold.
//!
//! This crate handles parsing of the system configuration (manifold.kdl):
//! where the module library lives and how the host runner is chosen.

pub mod error;
pub mod system;

pub use error::{ConfigError, ConfigResult};
pub use system::{SystemConfig, parse_system_config};
