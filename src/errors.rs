use rocket::http::Status;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to connect to MongoDB: {0}")]
    Connection(#[from] mongodb::error::Error),
    #[error("database connection not established; initialize must succeed first")]
    NotInitialized,
    #[error("collection name must not be empty")]
    InvalidCollectionName,
}

impl DbError {
    /// Status a request guard fails with when it hits this error.
    pub fn status(&self) -> Status {
        match self {
            DbError::Connection(_) | DbError::NotInitialized => Status::ServiceUnavailable,
            DbError::InvalidCollectionName => Status::InternalServerError,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(String),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Everything that can stop the process from starting or serving.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("failed to build CORS fairing: {0}")]
    Cors(#[from] rocket_cors::Error),
    #[error("server error: {0}")]
    Launch(#[from] Box<rocket::Error>),
}
