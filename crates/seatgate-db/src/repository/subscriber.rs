//! SurrealDB implementation of [`SubscriberRepository`].
//!
//! Batch operations (remediation deletes and bulk map rewrites) run
//! inside a single `BEGIN TRANSACTION … COMMIT TRANSACTION` block so a
//! partial failure never leaves some records cleaned and others not.

use chrono::{DateTime, Utc};
use seatgate_core::error::SeatgateResult;
use seatgate_core::models::key::SubscriptionMap;
use seatgate_core::models::subscriber::{CreateSubscriber, Subscriber};
use seatgate_core::repository::SubscriberRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::repository::{SubscriptionEntry, entries_from_map, map_from_entries};

/// DB-side row struct for queries where the record id is already known.
#[derive(Debug, SurrealValue)]
struct SubscriberRow {
    email: Option<String>,
    subscriptions: Vec<SubscriptionEntry>,
    disabled: bool,
    last_seen_at: Option<DateTime<Utc>>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record id via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SubscriberRowWithId {
    record_id: String,
    email: Option<String>,
    subscriptions: Vec<SubscriptionEntry>,
    disabled: bool,
    last_seen_at: Option<DateTime<Utc>>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubscriberRow {
    fn into_subscriber(self, id: String) -> Subscriber {
        Subscriber {
            id,
            email: self.email,
            subscriptions: map_from_entries(self.subscriptions),
            disabled: self.disabled,
            last_seen_at: self.last_seen_at,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl SubscriberRowWithId {
    fn into_subscriber(self) -> Subscriber {
        Subscriber {
            id: self.record_id,
            email: self.email,
            subscriptions: map_from_entries(self.subscriptions),
            disabled: self.disabled,
            last_seen_at: self.last_seen_at,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// SurrealDB implementation of the Subscriber repository.
#[derive(Clone)]
pub struct SurrealSubscriberRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriberRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubscriberRepository for SurrealSubscriberRepository<C> {
    async fn create(&self, input: CreateSubscriber) -> SeatgateResult<Subscriber> {
        let id = input.id.clone();
        let entries = entries_from_map(&input.subscriptions);
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('subscriber', $id) SET \
                 email = $email, \
                 subscriptions = $subscriptions, \
                 disabled = false, \
                 last_seen_at = NONE, \
                 metadata = $metadata",
            )
            .bind(("id", id.clone()))
            .bind(("email", input.email))
            .bind(("subscriptions", entries))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<SubscriberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscriber".into(),
            id: id.clone(),
        })?;

        Ok(row.into_subscriber(id))
    }

    async fn get_by_id(&self, id: &str) -> SeatgateResult<Subscriber> {
        let id = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('subscriber', $id)")
            .bind(("id", id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscriber".into(),
            id: id.clone(),
        })?;

        Ok(row.into_subscriber(id))
    }

    async fn get_by_email(&self, email: &str) -> SeatgateResult<Subscriber> {
        let email = email.to_lowercase();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscriber \
                 WHERE email != NONE AND string::lowercase(email) = $email",
            )
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriberRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscriber".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.into_subscriber())
    }

    async fn list_all(&self) -> SeatgateResult<Vec<Subscriber>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscriber \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriberRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(SubscriberRowWithId::into_subscriber)
            .collect())
    }

    async fn update_subscriptions(
        &self,
        id: &str,
        subscriptions: SubscriptionMap,
    ) -> SeatgateResult<Subscriber> {
        let id = id.to_string();
        let entries = entries_from_map(&subscriptions);

        let result = self
            .db
            .query(
                "UPDATE type::record('subscriber', $id) SET \
                 subscriptions = $subscriptions, \
                 updated_at = time::now()",
            )
            .bind(("id", id.clone()))
            .bind(("subscriptions", entries))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<SubscriberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscriber".into(),
            id: id.clone(),
        })?;

        Ok(row.into_subscriber(id))
    }

    async fn set_disabled(&self, id: &str, disabled: bool) -> SeatgateResult<Subscriber> {
        let id = id.to_string();

        // Disabling always clears the map in the same write — no
        // partial disable state is observable.
        let query = if disabled {
            "UPDATE type::record('subscriber', $id) SET \
             disabled = true, subscriptions = [], \
             updated_at = time::now()"
        } else {
            "UPDATE type::record('subscriber', $id) SET \
             disabled = false, updated_at = time::now()"
        };

        let result = self
            .db
            .query(query)
            .bind(("id", id.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<SubscriberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscriber".into(),
            id: id.clone(),
        })?;

        Ok(row.into_subscriber(id))
    }

    async fn touch_last_seen(&self, id: &str) -> SeatgateResult<()> {
        self.db
            .query(
                "UPDATE type::record('subscriber', $id) SET \
                 last_seen_at = time::now(), updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_batch(&self, ids: &[String]) -> SeatgateResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut statements = vec!["BEGIN TRANSACTION;".to_string()];
        for i in 0..ids.len() {
            statements.push(format!("DELETE type::record('subscriber', $id{i});"));
        }
        statements.push("COMMIT TRANSACTION;".to_string());

        let mut builder = self.db.query(statements.join("\n"));
        for (i, id) in ids.iter().enumerate() {
            builder = builder.bind((format!("id{i}"), id.clone()));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(ids.len() as u64)
    }

    async fn update_subscriptions_batch(
        &self,
        changes: Vec<(String, SubscriptionMap)>,
    ) -> SeatgateResult<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let total = changes.len() as u64;

        let mut statements = vec!["BEGIN TRANSACTION;".to_string()];
        for i in 0..changes.len() {
            statements.push(format!(
                "UPDATE type::record('subscriber', $id{i}) SET \
                 subscriptions = $subs{i}, updated_at = time::now();"
            ));
        }
        statements.push("COMMIT TRANSACTION;".to_string());

        let mut builder = self.db.query(statements.join("\n"));
        for (i, (id, map)) in changes.iter().enumerate() {
            builder = builder
                .bind((format!("id{i}"), id.clone()))
                .bind((format!("subs{i}"), entries_from_map(map)));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(total)
    }
}
