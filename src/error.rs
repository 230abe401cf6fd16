use rocket::http::Status;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] rocket::tokio::task::JoinError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid username and/or password")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// HTTP status a handler should answer with for this error.
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidInput(_) => Status::BadRequest,
            Error::InvalidCredentials => Status::Forbidden,
            Error::NotFound(_) => Status::NotFound,
            Error::Conflict(_) => Status::Conflict,
            _ => Status::InternalServerError,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status() == Status::InternalServerError
    }

    /// Message safe to show to the user. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Something went wrong on our side. Please try again.".to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = Error::Migration("relation \"users\" already exists".to_string());
        assert_eq!(err.status(), Status::InternalServerError);
        assert!(!err.public_message().contains("users"));
    }

    #[test]
    fn user_errors_keep_their_message() {
        let err = Error::Conflict("Username already exists".to_string());
        assert_eq!(err.status(), Status::Conflict);
        assert_eq!(err.public_message(), "Username already exists");
        assert_eq!(Error::InvalidCredentials.status(), Status::Forbidden);
        assert_eq!(Error::invalid("Must provide a username").status(), Status::BadRequest);
    }
}
