//! CodeCollab: accounts, projects and code files behind a browser editor.

use std::sync::Arc;

use rocket::figment::Figment;
use rocket::fs::{relative, FileServer};
use rocket::{Build, Rocket};

pub mod config;
pub mod db;
pub mod error;
pub mod languages;
pub mod models;
pub mod responses;
pub mod routes;
pub mod schema;
pub mod services;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod views;

use config::Config;
use store::Store;

/// Managed state shared by every handler.
pub struct AppState {
    store: Arc<dyn Store>,
    password_cost: u32,
}

impl AppState {
    pub fn new(store: Box<dyn Store>, password_cost: u32) -> Self {
        AppState {
            store: Arc::from(store),
            password_cost,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Owned handle for work moved off the async workers.
    pub fn shared_store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// bcrypt cost for new password hashes.
    pub fn password_cost(&self) -> u32 {
        self.password_cost
    }
}

fn build(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(telemetry::RequestLogger)
        .mount("/", routes::page_routes())
        .mount("/api", routes::api_routes())
        .mount("/static", FileServer::from(relative!("static")))
        .register("/", routes::catchers())
}

// Used by main.rs; the store is chosen on ignition.
pub fn rocket_instance(config: Config) -> Rocket<Build> {
    let figment = config.figment();
    build(figment).attach(db::stage(config.database, config.bcrypt_cost))
}

/// Rocket instance over an already opened store.
pub fn rocket_with_store(config: &Config, store: Box<dyn Store>) -> Rocket<Build> {
    build(config.figment()).manage(AppState::new(store, config.bcrypt_cost))
}
