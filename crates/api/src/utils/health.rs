//! Health report served by `GET /health`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Share of healthy components required for the service to report healthy.
const HEALTHY_THRESHOLD: f64 = 0.8;

/// Overall health of the server
///
/// # Example
/// ```
/// use backoffice_api::utils::health::{ComponentHealth, HealthStatus};
///
/// let mut status = HealthStatus::new()
///     .add_component(ComponentHealth::healthy("database"))
///     .add_component(ComponentHealth::unhealthy("quickbooks", "token store unreadable"));
/// status.calculate_score();
///
/// assert_eq!(status.score, 0.5);
/// assert!(!status.is_healthy);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub is_healthy: bool,
    /// `healthy_components / total_components`, 1.0 with no components.
    pub score: f64,
    pub components: Vec<ComponentHealth>,
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self { is_healthy: true, score: 1.0, components: Vec::new(), checked_at: Utc::now() }
    }

    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Call after all components have been added.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy_count = self.components.iter().filter(|c| c.is_healthy).count();
        self.score = healthy_count as f64 / self.components.len() as f64;
        self.is_healthy = self.score >= HEALTHY_THRESHOLD;
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
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

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
