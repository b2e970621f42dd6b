//! Parsing and validation of `isag.toml` runner configuration.
//!
//! The processor under test is described by an immutable [`RunnerConfig`]:
//! the architecture parameters (word size, register counts, stride,
//! endianness), the simulator signal paths used to sample its state, and
//! the run-loop timing. Values come from `isag.toml` and may be overridden
//! through `ISAG_*` environment variables.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    apply_env_overrides, load_config, load_config_from_str, load_default_config, validate_config,
    CONFIG_FILE_NAME,
};
pub use types::*;
