//! Drain pass states and the per-pass report

use std::time::Duration;

use serde::Serialize;
use tnt_domain::impl_label_conversions;

/// Where the sync engine is within a drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainState {
    /// Nothing in flight
    #[default]
    Idle,
    /// Head record in flight
    Draining,
    /// Queue exhausted, handing failures to the sink
    Reconciling,
}

impl_label_conversions!(DrainState {
    Idle => "idle",
    Draining => "draining",
    Reconciling => "reconciling",
});

/// Outcome of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Ingest calls made; equals the snapshot length
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    /// Post-attempt queue writes that did not land
    pub persist_failures: usize,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl DrainReport {
    /// True when the pass had nothing to do.
    pub const fn is_noop(&self) -> bool {
        self.attempted == 0
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}
