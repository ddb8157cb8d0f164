//! Audit engine configuration.

use std::time::Duration;

/// Configuration for a reconciliation audit run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// The operator's own email, known to exist in the identity
    /// source. The self-check guard verifies the existence check
    /// against this address before trusting any result.
    pub operator_email: String,
    /// Pause between subscribers — rate-limiting courtesy to the
    /// identity source, not a correctness requirement.
    pub item_delay: Duration,
}

impl AuditConfig {
    pub fn new(operator_email: impl Into<String>) -> Self {
        Self {
            operator_email: operator_email.into(),
            item_delay: Duration::from_millis(200),
        }
    }

    pub fn with_item_delay(mut self, item_delay: Duration) -> Self {
        self.item_delay = item_delay;
        self
    }
}
