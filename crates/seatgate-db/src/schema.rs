//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Record ids are externally assigned strings. Enums are stored as
//! strings with ASSERT constraints for validation. Subscription maps
//! are stored as arrays of `{organization_id, feed_id, active}`
//! objects — the composite key is never persisted as a joined string.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations (read-only to the core; written by tenant admin)
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD license ON TABLE organization TYPE string \
    ASSERT $value IN ['Professional', 'Organization'];
DEFINE FIELD feeds ON TABLE organization TYPE array DEFAULT [];
DEFINE FIELD feeds.* ON TABLE organization TYPE object;
DEFINE FIELD feeds.*.id ON TABLE organization TYPE string;
DEFINE FIELD feeds.*.name ON TABLE organization TYPE string;
DEFINE FIELD feeds.*.access ON TABLE organization TYPE string \
    ASSERT $value IN ['Open', 'Restricted'];
DEFINE FIELD feeds.*.paused ON TABLE organization TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Subscribers
-- =======================================================================
DEFINE TABLE subscriber SCHEMAFULL;
DEFINE FIELD email ON TABLE subscriber TYPE option<string>;
DEFINE FIELD subscriptions ON TABLE subscriber TYPE array DEFAULT [];
DEFINE FIELD subscriptions.* ON TABLE subscriber TYPE object;
DEFINE FIELD subscriptions.*.organization_id ON TABLE subscriber \
    TYPE string;
DEFINE FIELD subscriptions.*.feed_id ON TABLE subscriber TYPE string;
DEFINE FIELD subscriptions.*.active ON TABLE subscriber TYPE bool;
DEFINE FIELD disabled ON TABLE subscriber TYPE bool DEFAULT false;
DEFINE FIELD last_seen_at ON TABLE subscriber TYPE option<datetime>;
DEFINE FIELD metadata ON TABLE subscriber TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE subscriber TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE subscriber TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subscriber_email ON TABLE subscriber COLUMNS email;

-- =======================================================================
-- Invitations (keyed by lowercased email)
-- =======================================================================
DEFINE TABLE invitation SCHEMAFULL;
DEFINE FIELD email ON TABLE invitation TYPE string;
DEFINE FIELD subscriptions ON TABLE invitation TYPE array DEFAULT [];
DEFINE FIELD subscriptions.* ON TABLE invitation TYPE object;
DEFINE FIELD subscriptions.*.organization_id ON TABLE invitation \
    TYPE string;
DEFINE FIELD subscriptions.*.feed_id ON TABLE invitation TYPE string;
DEFINE FIELD subscriptions.*.active ON TABLE invitation TYPE bool;
DEFINE FIELD organization_label ON TABLE invitation TYPE string;
DEFINE FIELD feed_labels ON TABLE invitation TYPE array DEFAULT [];
DEFINE FIELD feed_labels.* ON TABLE invitation TYPE string;
DEFINE FIELD status ON TABLE invitation TYPE string \
    ASSERT $value IN ['Pending'];
DEFINE FIELD metadata ON TABLE invitation TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE invitation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_invitation_email ON TABLE invitation \
    COLUMNS email UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum. The
/// tracking table makes re-running safe: applied versions are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
