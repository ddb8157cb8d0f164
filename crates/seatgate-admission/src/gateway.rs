//! Mutation gateway — applies admission-approved changes to the
//! persistent store.
//!
//! Every mutation runs the admission controller first and aborts with
//! no partial write on denial. Admission and write are serialized per
//! organization through an async lock table: two concurrent grants to
//! the same organization can never both observe `current < limit` and
//! both commit (the check-then-act race). Directory and snapshot are
//! re-read under the lock before validation.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

use seatgate_core::directory::Directory;
use seatgate_core::error::{SeatgateError, SeatgateResult};
use seatgate_core::models::invitation::{CreateInvitation, Invitation};
use seatgate_core::models::key::SubscriptionMap;
use seatgate_core::models::subscriber::Subscriber;
use seatgate_core::repository::{
    InvitationRepository, OrganizationSource, SubscriberRepository,
};

use crate::service::{AdmissionController, ChangeSetDecision, new_admissions};

/// Result of an admission-gated subscription edit.
#[derive(Debug)]
pub enum EditOutcome {
    Applied(Subscriber),
    Denied(ChangeSetDecision),
}

/// Result of an admission-gated invitation.
#[derive(Debug)]
pub enum InviteOutcome {
    Created(Invitation),
    Denied(ChangeSetDecision),
}

/// Per-organization async lock table. Locks are acquired in sorted
/// order (the id set is a `BTreeSet`) so multi-organization edits
/// cannot deadlock each other.
#[derive(Default)]
struct OrgLocks {
    inner: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OrgLocks {
    async fn acquire(&self, organization_ids: &BTreeSet<String>) -> Vec<OwnedMutexGuard<()>> {
        let handles: Vec<Arc<Mutex<()>>> = {
            let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            organization_ids
                .iter()
                .map(|id| table.entry(id.clone()).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }
        guards
    }
}

/// Mutation gateway over the persistent store.
///
/// Generic over repository implementations so the service layer has
/// no dependency on the database crate.
pub struct MutationGateway<S, I, O>
where
    S: SubscriberRepository,
    I: InvitationRepository,
    O: OrganizationSource,
{
    subscribers: S,
    invitations: I,
    organizations: O,
    locks: OrgLocks,
}

impl<S, I, O> MutationGateway<S, I, O>
where
    S: SubscriberRepository,
    I: InvitationRepository,
    O: OrganizationSource,
{
    pub fn new(subscribers: S, invitations: I, organizations: O) -> Self {
        Self {
            subscribers,
            invitations,
            organizations,
            locks: OrgLocks::default(),
        }
    }

    async fn directory(&self) -> SeatgateResult<Directory> {
        let subscribers = self.subscribers.list_all().await?;
        let invitations = self.invitations.list_all().await?;
        Ok(Directory::new(subscribers, invitations))
    }

    /// Replace a subscriber's entire subscription map in one atomic
    /// write, after admission validation.
    pub async fn apply_subscription_edit(
        &self,
        subscriber_id: &str,
        new_map: SubscriptionMap,
    ) -> SeatgateResult<EditOutcome> {
        let before = self.subscribers.get_by_id(subscriber_id).await?;
        let mut locked = new_admissions(&before.subscriptions, &new_map);

        loop {
            let _guards = self.locks.acquire(&locked).await;

            let snapshot = self.organizations.load().await?;
            let directory = self.directory().await?;
            let subscriber = directory
                .subscriber(subscriber_id)
                .cloned()
                .ok_or_else(|| SeatgateError::NotFound {
                    entity: "subscriber".into(),
                    id: subscriber_id.into(),
                })?;

            // The persisted map may have moved between the pre-lock
            // read and now; if that widened the admission set, lock
            // the wider set and re-validate.
            let grown = new_admissions(&subscriber.subscriptions, &new_map);
            if !grown.iter().all(|org| locked.contains(org)) {
                locked = grown;
                continue;
            }

            let controller = AdmissionController::new(&directory, &snapshot);
            let decision = controller.validate_change_set(
                Some(&subscriber),
                &subscriber.subscriptions,
                &new_map,
            )?;
            if !decision.allowed {
                return Ok(EditOutcome::Denied(decision));
            }

            let updated = self
                .subscribers
                .update_subscriptions(subscriber_id, new_map)
                .await?;
            return Ok(EditOutcome::Applied(updated));
        }
    }

    /// Create an invitation, after the same admission validation an
    /// edit would get (quota is hard-blocked on both paths). Replaces
    /// any pending invitation with the same lowercased email.
    pub async fn create_invitation(
        &self,
        input: CreateInvitation,
    ) -> SeatgateResult<InviteOutcome> {
        if input.subscriptions.values().any(|active| !active) {
            return Err(SeatgateError::Validation {
                message: "invitation targets must all be active".into(),
            });
        }

        let email = input.email.to_lowercase();
        let empty = SubscriptionMap::new();
        let targets = new_admissions(&empty, &input.subscriptions);
        let _guards = self.locks.acquire(&targets).await;

        let snapshot = self.organizations.load().await?;
        let directory = self.directory().await?;
        // If the invited address already registered, its record is the
        // admission subject — an already-subscribed organization is
        // exempt, same as the edit path.
        let existing = directory.subscriber_by_email(&email).cloned();
        let before = existing
            .as_ref()
            .map(|s| s.subscriptions.clone())
            .unwrap_or_default();

        let controller = AdmissionController::new(&directory, &snapshot);
        let decision =
            controller.validate_change_set(existing.as_ref(), &before, &input.subscriptions)?;
        if !decision.allowed {
            return Ok(InviteOutcome::Denied(decision));
        }

        let invitation = self
            .invitations
            .create(CreateInvitation { email, ..input })
            .await?;
        Ok(InviteOutcome::Created(invitation))
    }

    /// Set the disabled flag. Disabling clears the subscription map in
    /// the same single-document write; only growth needs admission, so
    /// neither direction is gated.
    pub async fn set_disabled(
        &self,
        subscriber_id: &str,
        disabled: bool,
    ) -> SeatgateResult<Subscriber> {
        self.subscribers.set_disabled(subscriber_id, disabled).await
    }
}
