use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use rocket::figment::Figment;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const DEV_SECRET_KEY: &str = "codecollab-dev-secret-key";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SQLITE_PATH: &str = "codecollab.db";

/// Where `DATABASE_URL` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    Postgres(String),
    Sqlite(PathBuf),
}

impl DatabaseUrl {
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(DatabaseUrl::Postgres(url.to_string()));
        }
        if let Some(path) = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            if path.is_empty() {
                return Err(Error::Config("DATABASE_URL has an empty sqlite path".to_string()));
            }
            return Ok(DatabaseUrl::Sqlite(PathBuf::from(path)));
        }
        Err(Error::Config(format!(
            "unsupported DATABASE_URL scheme (expected postgres:// or sqlite:): {url}"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<DatabaseUrl>,
    /// SQLite file tried when PostgreSQL is unavailable or not configured.
    pub sqlite_path: PathBuf,
    /// Fall through PostgreSQL -> SQLite -> memory instead of failing.
    pub fallback: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub database: DatabaseConfig,
    pub bcrypt_cost: u32,
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name} must be a boolean, got {other:?}"))),
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} is not valid: {value:?}")))
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = match get("SECRET_KEY") {
            Some(key) => key,
            None => {
                tracing::warn!("SECRET_KEY is not set; using the development key");
                DEV_SECRET_KEY.to_string()
            }
        };

        let host = match get("HOST") {
            Some(host) => parse_value("HOST", &host)?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match get("PORT") {
            Some(port) => parse_value("PORT", &port)?,
            None => DEFAULT_PORT,
        };
        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(cost) => parse_value("BCRYPT_COST", &cost)?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(Error::Config(format!(
                "BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}"
            )));
        }

        let database = DatabaseConfig {
            url: get("DATABASE_URL").as_deref().map(DatabaseUrl::parse).transpose()?,
            sqlite_path: get("SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            fallback: match get("DB_FALLBACK") {
                Some(value) => parse_bool("DB_FALLBACK", &value)?,
                None => true,
            },
        };

        Ok(Config {
            secret_key,
            host,
            port,
            database,
            bcrypt_cost,
        })
    }

    /// Key material for Rocket's signed cookies. Any secret length is accepted.
    fn cookie_key(&self) -> String {
        hex::encode(Sha256::digest(self.secret_key.as_bytes()))
    }

    /// Rocket configuration: defaults and `ROCKET_*` overrides, then our values.
    pub fn figment(&self) -> Figment {
        rocket::Config::figment()
            .merge(("address", self.host))
            .merge(("port", self.port))
            .merge(("secret_key", self.cookie_key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.secret_key, DEV_SECRET_KEY);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.sqlite_path, PathBuf::from("codecollab.db"));
        assert!(config.database.fallback);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn reads_environment() {
        let config = config(&[
            ("SECRET_KEY", "s3cret"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("DATABASE_URL", "postgres://cc:cc@localhost/codecollab"),
            ("DB_FALLBACK", "off"),
            ("BCRYPT_COST", "4"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(
            config.database.url,
            Some(DatabaseUrl::Postgres("postgres://cc:cc@localhost/codecollab".to_string()))
        );
        assert!(!config.database.fallback);
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn parses_sqlite_urls() {
        assert_eq!(
            DatabaseUrl::parse("sqlite://data/app.db").unwrap(),
            DatabaseUrl::Sqlite(PathBuf::from("data/app.db"))
        );
        assert_eq!(
            DatabaseUrl::parse("sqlite:app.db").unwrap(),
            DatabaseUrl::Sqlite(PathBuf::from("app.db"))
        );
        assert!(DatabaseUrl::parse("mysql://localhost/db").is_err());
        assert!(DatabaseUrl::parse("sqlite://").is_err());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("DB_FALLBACK", "maybe")]).is_err());
        assert!(config(&[("BCRYPT_COST", "2")]).is_err());
    }

    #[test]
    fn cookie_key_is_256_bit_hex() {
        let config = config(&[("SECRET_KEY", "short")]).unwrap();
        let key = config.cookie_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
