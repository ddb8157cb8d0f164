//! Subscriber-store handle: connection, schema, and repository wiring.

use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::repository::{
    SurrealInvitationRepository, SurrealOrganizationSource, SurrealSubscriberRepository,
};
use crate::schema::run_migrations;

/// Settings for a remote SurrealDB deployment.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "seatgate".into(),
            database: "registry".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// A connected handle to the subscriber store with its schema brought
/// up to date.
///
/// Generic over the engine so deployment and tests share one wiring
/// path: the embedding application connects over WebSocket via
/// [`DbManager::connect`], tests hand an in-memory engine to
/// [`DbManager::initialize`]. The repository accessors are the
/// intended way to obtain implementations of the `seatgate-core`
/// traits.
#[derive(Clone)]
pub struct DbManager<C: Connection> {
    db: Surreal<C>,
}

impl DbManager<Client> {
    /// Connect to a remote deployment, authenticate as root, select
    /// the configured namespace and database, and run any pending
    /// migrations.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to subscriber store"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Self::initialize(db).await
    }
}

impl<C: Connection> DbManager<C> {
    /// Wrap an already-selected connection and run any pending
    /// migrations.
    pub async fn initialize(db: Surreal<C>) -> Result<Self, DbError> {
        run_migrations(&db).await?;
        info!("Subscriber store ready");
        Ok(Self { db })
    }

    pub fn subscribers(&self) -> SurrealSubscriberRepository<C> {
        SurrealSubscriberRepository::new(self.db.clone())
    }

    pub fn invitations(&self) -> SurrealInvitationRepository<C> {
        SurrealInvitationRepository::new(self.db.clone())
    }

    pub fn organizations(&self) -> SurrealOrganizationSource<C> {
        SurrealOrganizationSource::new(self.db.clone())
    }

    /// The underlying client, for queries the repositories do not
    /// cover.
    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }
}
