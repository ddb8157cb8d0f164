//! Reconciliation audit engine.
//!
//! A single long-running, cancelable scan over the full subscriber
//! collection. The scan is deliberately sequential: it is bound by
//! external identity lookups, and parallelizing it would defeat the
//! rate-limiting courtesy and risk throttling errors being mis-read
//! as "identity not found".

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use seatgate_core::error::SeatgateResult;
use seatgate_core::models::audit::{AuditProgress, AuditReport, OrphanFinding, StaleFinding};
use seatgate_core::repository::{IdentityProvider, OrganizationSource, SubscriberRepository};

use crate::config::AuditConfig;

/// Final result of one audit invocation.
///
/// `Aborted` is reached only during initialization, when the identity
/// existence check cannot be trusted; `Canceled` discards all partial
/// findings — only a `Completed` report is ever actionable.
#[derive(Debug)]
pub enum AuditOutcome {
    Completed(AuditReport),
    Aborted { diagnostic: String },
    Canceled,
}

/// Cooperative cancellation flag, polled at every suspension point of
/// the scan (per-item lookup and inter-item delay).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Reconciliation audit engine over the identity source, subscriber
/// store, and organization source.
pub struct ReconciliationAudit<P, S, O>
where
    P: IdentityProvider,
    S: SubscriberRepository,
    O: OrganizationSource,
{
    identity: P,
    subscribers: S,
    organizations: O,
    config: AuditConfig,
}

impl<P, S, O> ReconciliationAudit<P, S, O>
where
    P: IdentityProvider,
    S: SubscriberRepository,
    O: OrganizationSource,
{
    pub fn new(identity: P, subscribers: S, organizations: O, config: AuditConfig) -> Self {
        Self {
            identity,
            subscribers,
            organizations,
            config,
        }
    }

    /// Run one full scan. Progress is reported after each subscriber.
    ///
    /// Self-check first: the existence check must return a non-empty
    /// result for the operator's own known-valid address. If it does
    /// not, the provider's enumeration protection is likely
    /// suppressing existence results and every subscriber would be
    /// misreported as an orphan — the run aborts with zero findings.
    pub async fn run(
        &self,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(AuditProgress),
    ) -> SeatgateResult<AuditOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, operator = %self.config.operator_email, "Starting reconciliation audit");

        // Never trust an existence check that fails for a known-valid
        // identity.
        match self.identity.exists(&self.config.operator_email).await {
            Ok(methods) if methods.is_empty() => {
                let diagnostic = format!(
                    "identity self-check returned no sign-in methods for {}; \
                     the provider's enumeration protection is likely enabled \
                     and would misreport every subscriber as an orphan",
                    self.config.operator_email,
                );
                warn!(%run_id, "Audit aborted: {diagnostic}");
                return Ok(AuditOutcome::Aborted { diagnostic });
            }
            Ok(_) => {}
            Err(e) => {
                let diagnostic = format!(
                    "identity self-check for {} failed: {e}; \
                     an unverifiable existence check is never trusted",
                    self.config.operator_email,
                );
                warn!(%run_id, "Audit aborted: {diagnostic}");
                return Ok(AuditOutcome::Aborted { diagnostic });
            }
        }

        // Snapshot the valid-target set once, up front, so the scan
        // stays consistent even if feeds are edited while it runs.
        let snapshot = self.organizations.load().await?;
        let valid_targets = snapshot.valid_targets();
        let subscribers = self.subscribers.list_all().await?;
        let total = subscribers.len();
        info!(%run_id, total, "Audit scanning");

        let mut orphans = Vec::new();
        let mut stale = Vec::new();
        let mut skipped = 0usize;

        for (index, subscriber) in subscribers.iter().enumerate() {
            if cancel.is_canceled() {
                info!(%run_id, scanned = index, "Audit canceled; findings discarded");
                return Ok(AuditOutcome::Canceled);
            }

            if let Some(email) = &subscriber.email {
                match self.identity.exists(email).await {
                    Ok(methods) if methods.is_empty() => {
                        orphans.push(OrphanFinding {
                            subscriber_id: subscriber.id.clone(),
                            email: email.clone(),
                        });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Transient lookup failure: this subscriber is
                        // "unknown", not an orphan. Omit it from both
                        // findings lists and keep scanning.
                        warn!(
                            %run_id,
                            subscriber = %subscriber.id,
                            error = %e,
                            "Existence check failed; skipping subscriber for this run"
                        );
                        skipped += 1;
                        on_progress(AuditProgress {
                            current: index + 1,
                            total,
                        });
                        tokio::time::sleep(self.config.item_delay).await;
                        continue;
                    }
                }
            }

            // Active and inactive keys both count: a false entry
            // referencing a deleted feed is still dead weight.
            let stale_keys: Vec<_> = subscriber
                .subscriptions
                .keys()
                .filter(|key| !valid_targets.contains(*key))
                .cloned()
                .collect();
            if !stale_keys.is_empty() {
                stale.push(StaleFinding {
                    subscriber_id: subscriber.id.clone(),
                    stale_keys,
                });
            }

            on_progress(AuditProgress {
                current: index + 1,
                total,
            });
            if index + 1 < total {
                tokio::time::sleep(self.config.item_delay).await;
            }
        }

        if cancel.is_canceled() {
            info!(%run_id, "Audit canceled; findings discarded");
            return Ok(AuditOutcome::Canceled);
        }

        let report = AuditReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            orphans,
            stale,
            scanned: total,
            skipped,
        };
        info!(
            %run_id,
            orphans = report.orphans.len(),
            stale = report.stale.len(),
            skipped = report.skipped,
            "Audit completed"
        );
        Ok(AuditOutcome::Completed(report))
    }
}
