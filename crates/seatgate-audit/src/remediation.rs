//! Remediation executor — atomic bulk cleanup of audit findings.
//!
//! Both operations are destructive and expect the caller to have
//! collected explicit operator confirmation for the findings of a
//! *completed* audit run. Both are idempotent: re-running against
//! findings that were already cleaned is a no-op, not an error.

use tracing::info;

use seatgate_core::error::{SeatgateError, SeatgateResult};
use seatgate_core::models::audit::{OrphanFinding, StaleFinding};
use seatgate_core::repository::SubscriberRepository;

/// Executes bulk remediation against the subscriber store.
pub struct RemediationExecutor<S: SubscriberRepository> {
    subscribers: S,
}

impl<S: SubscriberRepository> RemediationExecutor<S> {
    pub fn new(subscribers: S) -> Self {
        Self { subscribers }
    }

    /// Delete every orphaned record in one atomic batch. Returns the
    /// number of records submitted for deletion.
    pub async fn delete_orphans(&self, orphans: &[OrphanFinding]) -> SeatgateResult<u64> {
        if orphans.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = orphans.iter().map(|o| o.subscriber_id.clone()).collect();
        let deleted = self.subscribers.delete_batch(&ids).await?;
        info!(deleted, "Orphan remediation applied");
        Ok(deleted)
    }

    /// Remove exactly the named stale keys from each listed
    /// subscriber — never the whole map — in one atomic batch across
    /// all affected records. Returns the number of records rewritten.
    ///
    /// Each subscriber is re-read first: records deleted since the
    /// audit are skipped, and a map that no longer holds any of the
    /// named keys is left untouched.
    pub async fn strip_stale_keys(&self, stale: &[StaleFinding]) -> SeatgateResult<u64> {
        let mut changes = Vec::new();

        for finding in stale {
            let subscriber = match self.subscribers.get_by_id(&finding.subscriber_id).await {
                Ok(subscriber) => subscriber,
                Err(SeatgateError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            };

            let mut new_map = subscriber.subscriptions.clone();
            for key in &finding.stale_keys {
                new_map.remove(key);
            }
            if new_map.len() != subscriber.subscriptions.len() {
                changes.push((finding.subscriber_id.clone(), new_map));
            }
        }

        if changes.is_empty() {
            return Ok(0);
        }

        let rewritten = self.subscribers.update_subscriptions_batch(changes).await?;
        info!(rewritten, "Stale-key remediation applied");
        Ok(rewritten)
    }
}
