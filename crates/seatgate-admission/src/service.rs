//! Admission controller — decides whether a proposed set of
//! subscription changes may commit.
//!
//! Purely advisory: every operation here is side-effect free and must
//! be called before any write. Denials are returned as structured
//! decision values so the front end can display them verbatim; they
//! are never errors.

use std::collections::BTreeSet;

use seatgate_core::directory::Directory;
use seatgate_core::error::{SeatgateError, SeatgateResult};
use seatgate_core::license::SeatLimit;
use seatgate_core::models::key::SubscriptionMap;
use seatgate_core::models::subscriber::Subscriber;
use seatgate_core::snapshot::OrganizationSnapshot;

/// Outcome of a single-organization admission check.
#[derive(Debug, Clone)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub organization_id: String,
    pub limit: SeatLimit,
    /// Distinct active subscribers currently counted for the
    /// organization.
    pub current: usize,
    /// Seats left, if the tier is bounded.
    pub remaining: Option<u32>,
    /// Operator-displayable denial reason; names the tier and the
    /// numeric limit.
    pub reason: Option<String>,
}

/// Outcome of validating a whole subscription-map replacement.
///
/// Violations are collected across every newly admitted organization
/// rather than short-circuiting on the first, so an administrator
/// sees all of them at once.
#[derive(Debug, Clone)]
pub struct ChangeSetDecision {
    pub allowed: bool,
    pub violations: Vec<AdmissionDecision>,
}

/// Organizations the subscriber newly enters: no active key before,
/// at least one active key after. Shrinking, no-op toggles, and
/// inactive entries never produce an admission.
pub fn new_admissions(before: &SubscriptionMap, after: &SubscriptionMap) -> BTreeSet<String> {
    let active_orgs = |map: &SubscriptionMap| -> BTreeSet<String> {
        map.iter()
            .filter(|(_, active)| **active)
            .map(|(key, _)| key.organization_id.clone())
            .collect()
    };

    let before_orgs = active_orgs(before);
    active_orgs(after)
        .into_iter()
        .filter(|org| !before_orgs.contains(org))
        .collect()
}

/// Admission controller over a directory and an organization snapshot,
/// both read-only views rebuilt by the caller on data change.
pub struct AdmissionController<'a> {
    directory: &'a Directory,
    snapshot: &'a OrganizationSnapshot,
}

impl<'a> AdmissionController<'a> {
    pub fn new(directory: &'a Directory, snapshot: &'a OrganizationSnapshot) -> Self {
        Self {
            directory,
            snapshot,
        }
    }

    /// May this identity be granted a subscription in the
    /// organization?
    ///
    /// A subscriber who already holds an active key there is allowed
    /// unconditionally — they are already counted, so toggling a
    /// second feed within the same organization can never be falsely
    /// rejected. Pass `None` for identities with no subscriber record
    /// yet (the invite path).
    pub fn can_grant(
        &self,
        organization_id: &str,
        subscriber: Option<&Subscriber>,
    ) -> SeatgateResult<AdmissionDecision> {
        let org = self.snapshot.get(organization_id).ok_or_else(|| {
            SeatgateError::NotFound {
                entity: "organization".into(),
                id: organization_id.into(),
            }
        })?;

        let limit = org.license.seat_limit();
        let current = self.directory.subscriber_count(organization_id);

        let already_counted =
            subscriber.is_some_and(|s| s.has_active_subscription(organization_id));
        let allowed = already_counted || limit.admits(current);

        let reason = (!allowed).then(|| {
            format!(
                "{} has reached the {} plan limit of {} active subscribers",
                org.name, org.license, limit,
            )
        });

        Ok(AdmissionDecision {
            allowed,
            organization_id: org.id.clone(),
            limit,
            current,
            remaining: limit.remaining(current),
            reason,
        })
    }

    /// Validate a full subscription-map replacement for one identity.
    ///
    /// Only growth is checked: the organizations where the map
    /// transitions from "no active key" to "≥1 active key" each run
    /// through [`Self::can_grant`], and every denial is collected.
    pub fn validate_change_set(
        &self,
        subscriber: Option<&Subscriber>,
        before: &SubscriptionMap,
        after: &SubscriptionMap,
    ) -> SeatgateResult<ChangeSetDecision> {
        let mut violations = Vec::new();

        for organization_id in new_admissions(before, after) {
            let decision = self.can_grant(&organization_id, subscriber)?;
            if !decision.allowed {
                violations.push(decision);
            }
        }

        Ok(ChangeSetDecision {
            allowed: violations.is_empty(),
            violations,
        })
    }
}
