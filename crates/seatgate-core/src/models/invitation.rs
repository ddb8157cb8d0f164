//! Invitation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::key::SubscriptionMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    Pending,
}

/// A pending invitation, keyed by lowercased email.
///
/// Once the invited address registers, the real subscriber record
/// shadows the invitation in the merged directory view; the invitation
/// itself is never promoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Lowercased email, the natural key.
    pub email: String,
    /// Target subscriptions; every entry is active.
    pub subscriptions: SubscriptionMap,
    /// Originating organization name, for display.
    pub organization_label: String,
    /// Invited feed names, for display.
    pub feed_labels: Vec<String>,
    pub status: InvitationStatus,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create (or replace) an invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    pub email: String,
    pub subscriptions: SubscriptionMap,
    pub organization_label: String,
    pub feed_labels: Vec<String>,
    pub metadata: Option<serde_json::Value>,
}
