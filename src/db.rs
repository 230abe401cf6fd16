// codecollab/src/db.rs
use std::path::PathBuf;

use rocket::fairing::AdHoc;

use crate::config::{DatabaseConfig, DatabaseUrl};
use crate::error::{Error, Result};
use crate::store::{MemoryStore, PgStore, SqliteStore, Store};
use crate::AppState;

/// One step of the backend fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Postgres(String),
    Sqlite(PathBuf),
    Memory,
}

impl Candidate {
    fn label(&self) -> String {
        match self {
            Candidate::Postgres(_) => "postgresql".to_string(),
            Candidate::Sqlite(path) => format!("sqlite ({})", path.display()),
            Candidate::Memory => "in-memory".to_string(),
        }
    }

    fn open(&self) -> Result<Box<dyn Store>> {
        let store: Box<dyn Store> = match self {
            Candidate::Postgres(url) => Box::new(PgStore::connect(url)?),
            Candidate::Sqlite(path) => Box::new(SqliteStore::new(path)?),
            Candidate::Memory => Box::new(MemoryStore::new()),
        };
        store.initialize()?;
        Ok(store)
    }
}

/// Backends to try, in order. Without fallback only the first is attempted.
pub fn candidates(config: &DatabaseConfig) -> Vec<Candidate> {
    let mut chain = match &config.url {
        Some(DatabaseUrl::Postgres(url)) => vec![
            Candidate::Postgres(url.clone()),
            Candidate::Sqlite(config.sqlite_path.clone()),
        ],
        Some(DatabaseUrl::Sqlite(path)) => vec![Candidate::Sqlite(path.clone())],
        None => vec![Candidate::Sqlite(config.sqlite_path.clone())],
    };
    chain.push(Candidate::Memory);

    if !config.fallback {
        chain.truncate(1);
    }
    chain
}

/// Opens the first backend in the chain that connects and bootstraps cleanly.
pub fn connect(config: &DatabaseConfig) -> Result<Box<dyn Store>> {
    let mut last_error = None;

    for (attempt, candidate) in candidates(config).into_iter().enumerate() {
        match candidate.open() {
            Ok(store) => {
                if attempt > 0 {
                    tracing::warn!(backend = %candidate.label(), "fell back to a secondary storage backend");
                }
                if candidate == Candidate::Memory {
                    tracing::warn!("in-memory storage: data will not survive a restart");
                }
                tracing::info!(backend = %candidate.label(), "storage ready");
                return Ok(store);
            }
            Err(err) => {
                tracing::warn!(backend = %candidate.label(), error = %err, "storage backend unavailable");
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::Config("no storage backend configured".to_string())))
}

// Fairing that opens the store on ignition and puts it in managed state.
pub fn stage(config: DatabaseConfig, bcrypt_cost: u32) -> AdHoc {
    AdHoc::try_on_ignite("CodeCollab Store", move |rocket| async move {
        let opened = rocket::tokio::task::spawn_blocking(move || connect(&config)).await;
        match opened {
            Ok(Ok(store)) => Ok(rocket.manage(AppState::new(store, bcrypt_cost))),
            Ok(Err(err)) => {
                tracing::error!(error = %err, "could not open any storage backend");
                Err(rocket)
            }
            Err(err) => {
                tracing::error!(error = %err, "storage task panicked");
                Err(rocket)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>, fallback: bool) -> DatabaseConfig {
        DatabaseConfig {
            url: url.map(|u| DatabaseUrl::parse(u).unwrap()),
            sqlite_path: PathBuf::from("fallback.db"),
            fallback,
        }
    }

    #[test]
    fn postgres_falls_back_to_sqlite_then_memory() {
        let chain = candidates(&config(Some("postgres://localhost/cc"), true));
        assert_eq!(
            chain,
            vec![
                Candidate::Postgres("postgres://localhost/cc".to_string()),
                Candidate::Sqlite(PathBuf::from("fallback.db")),
                Candidate::Memory,
            ]
        );
    }

    #[test]
    fn no_url_starts_with_sqlite() {
        let chain = candidates(&config(None, true));
        assert_eq!(chain[0], Candidate::Sqlite(PathBuf::from("fallback.db")));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn strict_mode_tries_only_the_configured_backend() {
        let chain = candidates(&config(Some("sqlite:explicit.db"), false));
        assert_eq!(chain, vec![Candidate::Sqlite(PathBuf::from("explicit.db"))]);
    }

    #[test]
    fn unreachable_sqlite_path_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: None,
            sqlite_path: dir.path().join("missing").join("nested").join("cc.db"),
            fallback: true,
        };
        let store = connect(&config).unwrap();
        assert_eq!(store.backend(), crate::store::Backend::Memory);

        let strict = DatabaseConfig { fallback: false, ..config };
        assert!(connect(&strict).is_err());
    }

    #[test]
    fn opens_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: Some(DatabaseUrl::Sqlite(dir.path().join("cc.db"))),
            sqlite_path: PathBuf::from("unused.db"),
            fallback: false,
        };
        let store = connect(&config).unwrap();
        assert_eq!(store.backend(), crate::store::Backend::Sqlite);
    }
}
