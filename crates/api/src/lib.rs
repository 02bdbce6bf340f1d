//! # TnT App
//!
//! Command-line host for the offline scan queue.
//!
//! This crate contains:
//! - CLI argument definitions
//! - Application context (dependency injection)
//! - Command handlers that drive the queue and sync worker
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires infrastructure adapters into the core queue service

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

pub use cli::{Cli, Commands};
pub use context::AppContext;
