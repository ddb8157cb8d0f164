//! Reconciliation audit findings and progress types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::key::SubscriptionKey;

/// A local subscriber record with no corresponding identity in the
/// external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanFinding {
    pub subscriber_id: String,
    pub email: String,
}

/// A subscriber holding keys that reference deleted feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleFinding {
    pub subscriber_id: String,
    /// The offending keys only — remediation strips exactly these.
    pub stale_keys: Vec<SubscriptionKey>,
}

/// Frozen result of one completed audit scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub orphans: Vec<OrphanFinding>,
    pub stale: Vec<StaleFinding>,
    /// Subscribers examined.
    pub scanned: usize,
    /// Subscribers skipped because their existence check failed
    /// transiently (omitted from both findings lists).
    pub skipped: usize,
}

/// Incremental scan progress, reported after each subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditProgress {
    pub current: usize,
    pub total: usize,
}
