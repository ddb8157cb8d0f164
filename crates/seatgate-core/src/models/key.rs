//! Composite subscription key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies one subscribable feed: `(organization, feed)`.
///
/// Persisted rows store the two components as separate fields; a key
/// is constructed exactly once at that boundary and never re-parsed
/// from a joined string deeper in the logic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionKey {
    pub organization_id: String,
    pub feed_id: String,
}

impl SubscriptionKey {
    pub fn new(organization_id: impl Into<String>, feed_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            feed_id: feed_id.into(),
        }
    }
}

impl std::fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.feed_id)
    }
}

/// A subscriber's feed memberships. The value marks the entry active
/// or inactive — a `false` entry is distinct from an absent one.
pub type SubscriptionMap = BTreeMap<SubscriptionKey, bool>;
