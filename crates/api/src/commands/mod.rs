//! Command handlers - CLI to queue bridge
//!
//! Each handler returns a serializable result that `main` prints as JSON.

mod capture;
mod queue;
mod status;
mod worker;

pub use capture::*;
pub use queue::*;
pub use status::*;
pub use worker::*;
