//! Subscriber domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::key::{SubscriptionKey, SubscriptionMap};

/// A registered subscriber.
///
/// The id is stable and externally assigned (derived from the login
/// identity at first registration). Records are deleted only by audit
/// remediation or explicit admin action; disabling keeps the record
/// but clears the subscription map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub email: Option<String>,
    pub subscriptions: SubscriptionMap,
    pub disabled: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscriber {
    /// Whether this subscriber holds at least one active key in the
    /// given organization.
    pub fn has_active_subscription(&self, organization_id: &str) -> bool {
        self.active_keys()
            .any(|key| key.organization_id == organization_id)
    }

    /// All active keys, in key order.
    pub fn active_keys(&self) -> impl Iterator<Item = &SubscriptionKey> {
        self.subscriptions
            .iter()
            .filter(|(_, active)| **active)
            .map(|(key, _)| key)
    }
}

/// Fields required to create a new subscriber record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriber {
    pub id: String,
    pub email: Option<String>,
    pub subscriptions: SubscriptionMap,
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn subscriber(keys: &[(&str, &str, bool)]) -> Subscriber {
        Subscriber {
            id: "u1".into(),
            email: None,
            subscriptions: keys
                .iter()
                .map(|(org, feed, active)| (SubscriptionKey::new(*org, *feed), *active))
                .collect(),
            disabled: false,
            last_seen_at: None,
            metadata: serde_json::Value::Object(Default::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_keys_skips_inactive_entries() {
        let s = subscriber(&[
            ("acme", "daily", true),
            ("acme", "weekly", false),
            ("beta", "news", true),
        ]);

        let active: Vec<_> = s.active_keys().cloned().collect();
        assert_eq!(
            active,
            vec![
                SubscriptionKey::new("acme", "daily"),
                SubscriptionKey::new("beta", "news"),
            ]
        );
    }

    #[test]
    fn inactive_entry_does_not_count_as_membership() {
        let s = subscriber(&[("acme", "weekly", false)]);
        assert!(!s.has_active_subscription("acme"));
        assert!(subscriber(&[("acme", "weekly", true)]).has_active_subscription("acme"));
    }
}
