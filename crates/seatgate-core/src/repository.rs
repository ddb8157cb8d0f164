//! Repository and external-collaborator trait definitions.
//!
//! All operations are async. Batch operations are atomic: either
//! every listed record is written or none are.

use crate::error::SeatgateResult;
use crate::models::invitation::{CreateInvitation, Invitation};
use crate::models::key::SubscriptionMap;
use crate::models::subscriber::{CreateSubscriber, Subscriber};
use crate::snapshot::OrganizationSnapshot;

// ---------------------------------------------------------------------------
// Persistent store
// ---------------------------------------------------------------------------

pub trait SubscriberRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSubscriber,
    ) -> impl Future<Output = SeatgateResult<Subscriber>> + Send;
    fn get_by_id(&self, id: &str) -> impl Future<Output = SeatgateResult<Subscriber>> + Send;
    fn get_by_email(&self, email: &str)
    -> impl Future<Output = SeatgateResult<Subscriber>> + Send;
    /// The full collection, as the audit scan and directory rebuild
    /// consume it.
    fn list_all(&self) -> impl Future<Output = SeatgateResult<Vec<Subscriber>>> + Send;
    /// Replace the entire subscription map in one atomic write.
    fn update_subscriptions(
        &self,
        id: &str,
        subscriptions: SubscriptionMap,
    ) -> impl Future<Output = SeatgateResult<Subscriber>> + Send;
    /// Set the disabled flag. Disabling clears the subscription map in
    /// the same write — no partial disable state is ever observable.
    fn set_disabled(
        &self,
        id: &str,
        disabled: bool,
    ) -> impl Future<Output = SeatgateResult<Subscriber>> + Send;
    fn touch_last_seen(&self, id: &str) -> impl Future<Output = SeatgateResult<()>> + Send;
    /// Delete every listed record in one atomic batch. Missing ids are
    /// skipped, so re-running a remediation is a no-op. Returns the
    /// number of ids submitted.
    fn delete_batch(&self, ids: &[String]) -> impl Future<Output = SeatgateResult<u64>> + Send;
    /// Replace subscription maps for several subscribers in one atomic
    /// batch. Returns the number of records submitted.
    fn update_subscriptions_batch(
        &self,
        changes: Vec<(String, SubscriptionMap)>,
    ) -> impl Future<Output = SeatgateResult<u64>> + Send;
}

pub trait InvitationRepository: Send + Sync {
    /// Create an invitation, replacing any pending one with the same
    /// lowercased email in the same transaction.
    fn create(
        &self,
        input: CreateInvitation,
    ) -> impl Future<Output = SeatgateResult<Invitation>> + Send;
    fn get_by_email(&self, email: &str)
    -> impl Future<Output = SeatgateResult<Invitation>> + Send;
    fn list_all(&self) -> impl Future<Output = SeatgateResult<Vec<Invitation>>> + Send;
    fn delete(&self, email: &str) -> impl Future<Output = SeatgateResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// External collaborators
// ---------------------------------------------------------------------------

/// Read-only feed of organization definitions. The embedding
/// application rebuilds the snapshot on each live-update notification.
pub trait OrganizationSource: Send + Sync {
    fn load(&self) -> impl Future<Output = SeatgateResult<OrganizationSnapshot>> + Send;
}

/// External identity existence check.
///
/// Returns the sign-in methods registered for an address; an empty
/// list means "not found" — or, with some providers' enumeration
/// protection enabled, "not telling". The audit engine's self-check
/// guard exists for exactly that second case.
pub trait IdentityProvider: Send + Sync {
    fn exists(&self, email: &str) -> impl Future<Output = SeatgateResult<Vec<String>>> + Send;
}
