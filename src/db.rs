//! # Database connection lifecycle
//!
//! `MongoLifecycle` owns the single pooled MongoDB client of the process. It is
//! created empty, becomes ready once [`MongoLifecycle::initialize`] has
//! connected and answered a `ping`, and goes back to empty on
//! [`MongoLifecycle::shutdown`].
//!
//! ```text
//! Uninitialized --initialize (ping ok)--> Ready
//! Uninitialized --initialize (error)----> Uninitialized
//! Ready         --shutdown--------------> Uninitialized
//! ```
//!
//! In the server the transitions are driven by [`MongoFairing`]: it connects
//! while Rocket ignites, before any request is accepted, and releases the pool
//! once Rocket has stopped accepting requests. Handlers reach the database
//! through the [`Db`] request guard.

use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use rocket::fairing::{self, Fairing, Info, Kind};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::{Build, Orbit, Rocket, State};
use tracing::{debug, error, info, warn};

use crate::errors::DbError;

/// Name of the database every accessor is scoped to.
pub const DATABASE_NAME: &str = "yourdrobe";

/// Pool bounds and the timeout applied to the startup probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub server_selection_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            min_pool_size: 1,
            server_selection_timeout: Duration::from_millis(5000),
        }
    }
}

struct ConnectionHandle {
    client: Client,
    database: Database,
}

#[derive(Default)]
pub struct MongoLifecycle {
    pool: PoolConfig,
    handle: RwLock<Option<ConnectionHandle>>,
}

impl MongoLifecycle {
    pub fn new(pool: PoolConfig) -> Self {
        Self {
            pool,
            handle: RwLock::new(None),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.handle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Connects to `uri` and verifies the server answers a `ping`.
    ///
    /// The handle is only published after the probe succeeded, so a failed
    /// call leaves the manager exactly as it was. Calling this while already
    /// ready replaces the live handle and shuts the old client down.
    pub async fn initialize(&self, uri: &str) -> Result<(), DbError> {
        info!(
            max_pool_size = self.pool.max_pool_size,
            min_pool_size = self.pool.min_pool_size,
            server_selection_timeout_ms = self.pool.server_selection_timeout.as_millis() as u64,
            "Connecting to MongoDB"
        );

        let client = match self.connect(uri).await {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to connect to MongoDB");
                return Err(e);
            }
        };

        self.publish(client).await;
        info!(database = DATABASE_NAME, "Successfully connected to MongoDB");
        Ok(())
    }

    /// Makes `client` the live handle, shutting down any handle it replaces.
    async fn publish(&self, client: Client) {
        let database = client.database(DATABASE_NAME);
        let replaced = self
            .handle
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ConnectionHandle { client, database });

        if let Some(old) = replaced {
            warn!("MongoDB was already initialized; shutting down the previous client");
            old.client.shutdown().await;
        }
    }

    async fn connect(&self, uri: &str) -> Result<Client, DbError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.max_pool_size = Some(self.pool.max_pool_size);
        options.min_pool_size = Some(self.pool.min_pool_size);
        options.server_selection_timeout = Some(self.pool.server_selection_timeout);

        let client = Client::with_options(options)?;

        if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
            client.shutdown().immediate(true).await;
            return Err(e.into());
        }

        Ok(client)
    }

    /// Releases the pool. Does nothing when not initialized.
    pub async fn shutdown(&self) {
        let taken = self
            .handle
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match taken {
            Some(handle) => {
                info!("Closing MongoDB connection...");
                handle.client.shutdown().await;
                info!("MongoDB connection closed");
            }
            None => debug!("MongoDB shutdown requested while not initialized"),
        }
    }

    pub fn database(&self) -> Result<Database, DbError> {
        self.handle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|handle| handle.database.clone())
            .ok_or(DbError::NotInitialized)
    }

    /// Collections are created lazily by the server, so `name` is not checked
    /// for existence.
    pub fn collection<T>(&self, name: &str) -> Result<Collection<T>, DbError>
    where
        T: Send + Sync,
    {
        let database = self.database()?;

        if name.is_empty() {
            return Err(DbError::InvalidCollectionName);
        }

        Ok(database.collection::<T>(name))
    }

    /// Fairing that initializes on ignite and shuts down with the server.
    pub fn fairing(self: &Arc<Self>, uri: impl Into<String>) -> MongoFairing {
        MongoFairing {
            mongo: Arc::clone(self),
            uri: uri.into(),
        }
    }
}

pub struct MongoFairing {
    mongo: Arc<MongoLifecycle>,
    uri: String,
}

#[rocket::async_trait]
impl Fairing for MongoFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB lifecycle",
            kind: Kind::Ignite | Kind::Shutdown,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        match self.mongo.initialize(&self.uri).await {
            Ok(()) => Ok(rocket),
            Err(_) => Err(rocket),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        self.mongo.shutdown().await;
    }
}

/// Request guard yielding the application database.
///
/// Fails with `503 Service Unavailable` when the manager is not ready. Take
/// `Result<Db, DbError>` instead to handle that case in the route.
pub struct Db(pub Database);

impl Deref for Db {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Db {
    type Error = DbError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let mongo = match request.guard::<&State<Arc<MongoLifecycle>>>().await {
            Outcome::Success(mongo) => mongo,
            _ => {
                return Outcome::Error((
                    rocket::http::Status::ServiceUnavailable,
                    DbError::NotInitialized,
                ));
            }
        };

        match mongo.database() {
            Ok(database) => Outcome::Success(Db(database)),
            Err(e) => Outcome::Error((e.status(), e)),
        }
    }
}
