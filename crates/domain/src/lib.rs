//! # TnT Domain
//!
//! Business domain types for the Track and Trace scan pipeline.
//!
//! This crate contains:
//! - Scan records and the failed-batch alias
//! - Domain error type and `Result` alias
//! - Configuration structures
//! - Geofencing math and constants
//!
//! ## Architecture
//! - No dependencies on other TnT crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod geo;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use geo::{is_final_destination, Coordinates};
pub use types::*;
