//! Configuration loading
//!
//! Environment variables first, then a probed JSON/TOML file, then defaults,
//! with optional environment variables overlaid on the last two.

pub mod loader;

pub use loader::{
    apply_env_overrides, load, load_from_env, load_from_file, load_with_source, probe_config_paths,
    ConfigSource,
};
