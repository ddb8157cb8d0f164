//! Subscription directory — the merged read-side projection of
//! subscriber records and pending invitations.
//!
//! The directory is recomputed from the full collections whenever the
//! underlying data changes (push-based refresh); it is never mutated
//! incrementally. All admission counting helpers live here.

use crate::models::invitation::Invitation;
use crate::models::subscriber::Subscriber;

/// One entry of the merged list. The discriminant is explicit so
/// downstream code switches on it rather than probing field presence.
#[derive(Debug, Clone)]
pub enum DirectoryEntry {
    Subscriber(Subscriber),
    Invitation(Invitation),
}

impl DirectoryEntry {
    /// Lowercased email, if the entry has one. Invitations always do.
    pub fn email(&self) -> Option<String> {
        match self {
            DirectoryEntry::Subscriber(s) => s.email.as_deref().map(str::to_lowercase),
            DirectoryEntry::Invitation(i) => Some(i.email.to_lowercase()),
        }
    }

    /// Deterministic presentation sort key: email when present, the
    /// subscriber id otherwise.
    fn sort_key(&self) -> String {
        match self {
            DirectoryEntry::Subscriber(s) => s
                .email
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| s.id.clone()),
            DirectoryEntry::Invitation(i) => i.email.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Directory {
    subscribers: Vec<Subscriber>,
    invitations: Vec<Invitation>,
}

impl Directory {
    pub fn new(subscribers: Vec<Subscriber>, invitations: Vec<Invitation>) -> Self {
        Self {
            subscribers,
            invitations,
        }
    }

    pub fn subscriber(&self, id: &str) -> Option<&Subscriber> {
        self.subscribers.iter().find(|s| s.id == id)
    }

    pub fn subscriber_by_email(&self, email: &str) -> Option<&Subscriber> {
        let email = email.to_lowercase();
        self.subscribers.iter().find(|s| {
            s.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(&email))
        })
    }

    /// Distinct subscribers holding at least one active key in the
    /// organization. A subscriber counts once per organization no
    /// matter how many of its feeds they follow.
    pub fn subscriber_count(&self, organization_id: &str) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.has_active_subscription(organization_id))
            .count()
    }

    /// Subscriber ∪ Invitation, deduplicated by lowercased email with
    /// the real subscriber record taking precedence, sorted ascending
    /// for deterministic presentation.
    pub fn merged_list(&self) -> Vec<DirectoryEntry> {
        let mut entries: Vec<DirectoryEntry> = self
            .subscribers
            .iter()
            .cloned()
            .map(DirectoryEntry::Subscriber)
            .collect();

        for invitation in &self.invitations {
            let email = invitation.email.to_lowercase();
            let shadowed = entries
                .iter()
                .any(|entry| entry.email().is_some_and(|e| e == email));
            if !shadowed {
                entries.push(DirectoryEntry::Invitation(invitation.clone()));
            }
        }

        entries.sort_by_key(DirectoryEntry::sort_key);
        entries
    }
}
