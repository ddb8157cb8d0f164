//! Seatgate Audit — registry reconciliation scan and bulk remediation.
//!
//! The audit engine cross-checks every local subscriber record against
//! the external identity source (orphan detection) and against the
//! current set of valid subscription targets (stale-key detection).
//! The remediation executor turns a completed report's findings into
//! atomic bulk cleanups.

pub mod config;
pub mod engine;
pub mod remediation;

pub use config::AuditConfig;
pub use engine::{AuditOutcome, CancelToken, ReconciliationAudit};
pub use remediation::RemediationExecutor;
