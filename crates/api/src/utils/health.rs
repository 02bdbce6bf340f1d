//! Component health for the `status` command.

use chrono::Utc;
use serde::Serialize;

/// Fraction of healthy components at or above which the app counts as
/// healthy.
const HEALTHY_THRESHOLD: f64 = 0.8;

/// Overall health of the local store and, when probed, the scan API.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub is_healthy: bool,

    /// `healthy_components / total_components`, 1.0 when nothing was checked
    pub score: f64,

    pub components: Vec<ComponentHealth>,

    /// Epoch seconds when the check ran
    pub timestamp: i64,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self { is_healthy: true, score: 1.0, components: Vec::new(), timestamp: Utc::now().timestamp() }
    }

    #[must_use]
    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `is_healthy`. Call after adding components.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy = self.components.iter().filter(|c| c.is_healthy).count();

        #[allow(clippy::cast_precision_loss)]
        let score = healthy as f64 / self.components.len() as f64;
        self.score = score;
        self.is_healthy = score >= HEALTHY_THRESHOLD;
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// e.g. `"database"`, `"scan_api"`
    pub name: String,
    pub is_healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_tracks_healthy_fraction() {
        let mut status = HealthStatus::new()
            .add_component(ComponentHealth::healthy("database"))
            .add_component(ComponentHealth::unhealthy("scan_api", "connection refused"));
        status.calculate_score();

        assert!((status.score - 0.5).abs() < f64::EPSILON);
        assert!(!status.is_healthy);
    }

    #[test]
    fn no_components_stays_healthy() {
        let mut status = HealthStatus::new();
        status.calculate_score();
        assert!(status.is_healthy);
    }
}
