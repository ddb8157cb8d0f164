//! SurrealDB implementation of [`OrganizationSource`].
//!
//! The organization collection is read-only to the admission/audit
//! core; `upsert` and `delete` are inherent methods for the external
//! tenant-administration collaborator (and for tests), not part of
//! the trait.

use chrono::{DateTime, Utc};
use seatgate_core::error::SeatgateResult;
use seatgate_core::models::organization::{
    Feed, FeedAccess, LicenseTier, Organization, UpsertOrganization,
};
use seatgate_core::repository::OrganizationSource;
use seatgate_core::snapshot::OrganizationSnapshot;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct FeedRow {
    id: String,
    name: String,
    access: String,
    paused: bool,
}

#[derive(Debug, SurrealValue)]
struct OrganizationRowWithId {
    record_id: String,
    name: String,
    license: String,
    feeds: Vec<FeedRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_license(s: &str) -> Result<LicenseTier, DbError> {
    match s {
        "Professional" => Ok(LicenseTier::Professional),
        "Organization" => Ok(LicenseTier::Organization),
        other => Err(DbError::Decode(format!("unknown license tier: {other}"))),
    }
}

fn license_to_string(license: LicenseTier) -> &'static str {
    match license {
        LicenseTier::Professional => "Professional",
        LicenseTier::Organization => "Organization",
    }
}

fn parse_access(s: &str) -> Result<FeedAccess, DbError> {
    match s {
        "Open" => Ok(FeedAccess::Open),
        "Restricted" => Ok(FeedAccess::Restricted),
        other => Err(DbError::Decode(format!("unknown feed access: {other}"))),
    }
}

fn access_to_string(access: FeedAccess) -> &'static str {
    match access {
        FeedAccess::Open => "Open",
        FeedAccess::Restricted => "Restricted",
    }
}

impl FeedRow {
    fn try_into_feed(self) -> Result<Feed, DbError> {
        let access = parse_access(&self.access)?;
        Ok(Feed {
            id: self.id,
            name: self.name,
            access,
            paused: self.paused,
        })
    }
}

impl OrganizationRowWithId {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        let license = parse_license(&self.license)?;
        let feeds = self
            .feeds
            .into_iter()
            .map(FeedRow::try_into_feed)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(Organization {
            id: self.record_id,
            name: self.name,
            license,
            feeds,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the read-only organization source.
#[derive(Clone)]
pub struct SurrealOrganizationSource<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationSource<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Create or replace an organization definition.
    pub async fn upsert(&self, input: UpsertOrganization) -> SeatgateResult<()> {
        let feeds: Vec<FeedRow> = input
            .feeds
            .into_iter()
            .map(|feed| FeedRow {
                id: feed.id,
                name: feed.name,
                access: access_to_string(feed.access).to_string(),
                paused: feed.paused,
            })
            .collect();

        self.db
            .query(
                "UPSERT type::record('organization', $id) SET \
                 name = $name, \
                 license = $license, \
                 feeds = $feeds, \
                 updated_at = time::now()",
            )
            .bind(("id", input.id))
            .bind(("name", input.name))
            .bind(("license", license_to_string(input.license).to_string()))
            .bind(("feeds", feeds))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    /// Remove an organization definition entirely.
    pub async fn delete(&self, id: &str) -> SeatgateResult<()> {
        self.db
            .query("DELETE type::record('organization', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}

impl<C: Connection> OrganizationSource for SurrealOrganizationSource<C> {
    async fn load(&self) -> SeatgateResult<OrganizationSnapshot> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organization \
                 ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;

        let organizations = rows
            .into_iter()
            .map(OrganizationRowWithId::try_into_organization)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(OrganizationSnapshot::new(organizations))
    }
}
