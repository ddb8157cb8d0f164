//! Organization (tenant) domain model.
//!
//! Organizations own feeds and carry the license tier that caps their
//! countable subscribers. They are created and updated by external
//! tenant administration; this core only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// License tier of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseTier {
    /// Capped subscriber count.
    Professional,
    /// Unbounded subscriber count.
    Organization,
}

impl std::fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseTier::Professional => write!(f, "Professional"),
            LicenseTier::Organization => write!(f, "Organization"),
        }
    }
}

/// Who may opt into a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedAccess {
    Open,
    Restricted,
}

/// A notification feed belonging to an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub access: FeedAccess,
    /// Paused feeds send nothing but remain valid subscription targets.
    pub paused: bool,
}

/// An organization groups feeds under one customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub license: LicenseTier,
    pub feeds: Vec<Feed>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full definition written by the external tenant-administration
/// collaborator. This core never constructs one outside of tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertOrganization {
    pub id: String,
    pub name: String,
    pub license: LicenseTier,
    pub feeds: Vec<Feed>,
}
