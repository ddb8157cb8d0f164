//! SurrealDB repository implementations.

mod invitation;
mod organization;
mod subscriber;

pub use invitation::SurrealInvitationRepository;
pub use organization::SurrealOrganizationSource;
pub use subscriber::SurrealSubscriberRepository;

use seatgate_core::models::key::{SubscriptionKey, SubscriptionMap};
use surrealdb_types::SurrealValue;

/// Persisted form of one subscription map entry. This is the only
/// place a composite key is assembled from or split into its parts.
#[derive(Debug, SurrealValue)]
pub(crate) struct SubscriptionEntry {
    organization_id: String,
    feed_id: String,
    active: bool,
}

pub(crate) fn entries_from_map(map: &SubscriptionMap) -> Vec<SubscriptionEntry> {
    map.iter()
        .map(|(key, active)| SubscriptionEntry {
            organization_id: key.organization_id.clone(),
            feed_id: key.feed_id.clone(),
            active: *active,
        })
        .collect()
}

pub(crate) fn map_from_entries(entries: Vec<SubscriptionEntry>) -> SubscriptionMap {
    entries
        .into_iter()
        .map(|entry| {
            (
                SubscriptionKey::new(entry.organization_id, entry.feed_id),
                entry.active,
            )
        })
        .collect()
}
