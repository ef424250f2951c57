#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde;
#[macro_use]
extern crate lazy_static;

use std::sync::Arc;

use mongodb::Client;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::{Config, StorageKind};
use crate::data::store::{MemoryStore, Store};
use crate::error::{BackendError, ConfigurationError};
use crate::identity::IdentifierCleaner;
use crate::middleware::no_cache::NoCache;
use crate::route::mount_api;
use crate::security::Security;

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod gate;
pub mod identity;
pub mod middleware;
pub mod resp;
pub mod route;
pub mod security;
pub mod util;
pub mod week;
pub mod workload;

pub async fn create(log_level: Option<Level>) -> Result<Rocket<Build>, BackendError> {
    if let Some(l) = log_level {
        let subscriber = FmtSubscriber::builder().with_max_level(l).finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set global logger: {}", err);
        };
        if let Err(err) = tracing_log::LogTracer::init() {
            eprintln!("Unable to forward log records: {}", err);
        }
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    let security = Security::load()?;

    let store: Store = match c.storage {
        StorageKind::MongoDb => {
            tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
            let client = Client::with_uri_str(c.mongodb_uri.as_str()).await?;

            tracing::info!("Using MongoDB database: {}", c.mongodb_db);
            let db = client.database(c.mongodb_db.as_str());

            if let Err(e) = db.list_collection_names(None).await {
                tracing::error!("Unable to connect to MongoDB.");
                return Err(e.into());
            }
            Arc::new(db)
        }
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage, nothing will be persisted.");
            Arc::new(MemoryStore::new())
        }
    };

    build(c, security, store).await
}

/// Assembles the server around already initialized parts.
pub async fn build(
    c: Config,
    security: Security,
    store: Store,
) -> Result<Rocket<Build>, BackendError> {
    store.prepare().await?;

    tracing::info!("Seeding {} lectures...", c.lectures.len());
    for lecture in &c.lectures {
        store.put_lecture(lecture.clone()).await?;
    }

    let cleaner = IdentifierCleaner::new(c.identity.identifier_marker.as_deref());

    tracing::info!("Starting HTTP server...");
    let mut r = rocket::build()
        .manage(c)
        .manage(security)
        .manage(store)
        .manage(cleaner);

    tracing::info!("Setting up CORS...");
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::All,
        allowed_methods: vec![Method::Get, Method::Post]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    r = r.attach(cors);
    r = r.attach(NoCache {
        prefixes: vec!["/app", "/api"],
    });
    r = mount_api(r);

    Ok(r)
}
