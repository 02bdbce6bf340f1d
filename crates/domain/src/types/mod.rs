//! Domain types and models

pub mod scan;

pub use scan::{recalculate_final_destinations, FailedBatch, ScanCoords, ScanLocation, ScanRecord};
