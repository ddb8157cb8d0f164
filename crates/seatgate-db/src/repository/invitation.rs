//! SurrealDB implementation of [`InvitationRepository`].
//!
//! Invitations are keyed by lowercased email. `create` replaces any
//! pending invitation for the same address in one transaction, so
//! re-inviting never fails with a duplicate error.

use chrono::{DateTime, Utc};
use seatgate_core::error::SeatgateResult;
use seatgate_core::models::invitation::{CreateInvitation, Invitation, InvitationStatus};
use seatgate_core::repository::InvitationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::repository::{SubscriptionEntry, entries_from_map, map_from_entries};

#[derive(Debug, SurrealValue)]
struct InvitationRow {
    email: String,
    subscriptions: Vec<SubscriptionEntry>,
    organization_label: String,
    feed_labels: Vec<String>,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<InvitationStatus, DbError> {
    match s {
        "Pending" => Ok(InvitationStatus::Pending),
        other => Err(DbError::Decode(format!(
            "unknown invitation status: {other}"
        ))),
    }
}

impl InvitationRow {
    fn try_into_invitation(self) -> Result<Invitation, DbError> {
        let status = parse_status(&self.status)?;
        Ok(Invitation {
            email: self.email,
            subscriptions: map_from_entries(self.subscriptions),
            organization_label: self.organization_label,
            feed_labels: self.feed_labels,
            status,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Invitation repository.
#[derive(Clone)]
pub struct SurrealInvitationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInvitationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InvitationRepository for SurrealInvitationRepository<C> {
    async fn create(&self, input: CreateInvitation) -> SeatgateResult<Invitation> {
        let email = input.email.to_lowercase();
        let entries = entries_from_map(&input.subscriptions);
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        // A single atomic UPSERT replaces any pending invitation for the
        // same address. DELETE-then-CREATE of the same record id inside an
        // explicit transaction fails on this SurrealDB version: the CREATE
        // reports the deleted record as still existing.
        let result = self
            .db
            .query(
                "UPSERT type::record('invitation', $email) SET \
                 email = $email, \
                 subscriptions = $subscriptions, \
                 organization_label = $organization_label, \
                 feed_labels = $feed_labels, \
                 status = 'Pending', \
                 metadata = $metadata",
            )
            .bind(("email", email.clone()))
            .bind(("subscriptions", entries))
            .bind(("organization_label", input.organization_label))
            .bind(("feed_labels", input.feed_labels))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invitation".into(),
            id: email,
        })?;

        Ok(row.try_into_invitation()?)
    }

    async fn get_by_email(&self, email: &str) -> SeatgateResult<Invitation> {
        let email = email.to_lowercase();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('invitation', $email)")
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invitation".into(),
            id: email,
        })?;

        Ok(row.try_into_invitation()?)
    }

    async fn list_all(&self) -> SeatgateResult<Vec<Invitation>> {
        let mut result = self
            .db
            .query("SELECT * FROM invitation ORDER BY email ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(InvitationRow::try_into_invitation)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn delete(&self, email: &str) -> SeatgateResult<()> {
        self.db
            .query("DELETE type::record('invitation', $email)")
            .bind(("email", email.to_lowercase()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
