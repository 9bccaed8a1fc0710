//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Unauthorized`] thrown when a caller cannot be identified.
//! - [`ExistingKey`] thrown when a unique key (e.g. an email) is taken.
//! - [`KeyNotFound`] thrown when an item is not found, or the caller may not
//!   touch it.
//!
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    ExistingKey(String),
    #[error("{0}")]
    KeyNotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
