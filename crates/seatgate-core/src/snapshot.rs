//! Read-only organization snapshot.
//!
//! The admission controller and the audit engine both work against an
//! explicitly passed snapshot of all organizations, rebuilt from the
//! source on each change notification and never mutated in place.
//! This keeps an audit scan consistent even if feeds are edited while
//! it runs.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::key::SubscriptionKey;
use crate::models::organization::Organization;

#[derive(Debug, Clone)]
pub struct OrganizationSnapshot {
    organizations: BTreeMap<String, Organization>,
}

impl OrganizationSnapshot {
    pub fn new(organizations: Vec<Organization>) -> Self {
        Self {
            organizations: organizations
                .into_iter()
                .map(|org| (org.id.clone(), org))
                .collect(),
        }
    }

    pub fn get(&self, organization_id: &str) -> Option<&Organization> {
        self.organizations.get(organization_id)
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }

    /// Every `(organization, feed)` pair currently defined. Keys not
    /// in this set reference deleted feeds.
    pub fn valid_targets(&self) -> BTreeSet<SubscriptionKey> {
        self.organizations
            .values()
            .flat_map(|org| {
                org.feeds
                    .iter()
                    .map(|feed| SubscriptionKey::new(org.id.clone(), feed.id.clone()))
            })
            .collect()
    }
}
