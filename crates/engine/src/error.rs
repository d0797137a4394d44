//! The module contains the error the engine can throw.
//!
//! The errors fall in three groups:
//!
//! - caller mistakes: [`InvalidAmount`], [`InvalidInput`], [`EmptyInput`],
//!   [`InvalidId`], [`DuplicateEmail`], [`InvalidCredentials`],
//!   [`InvalidToken`], [`InsufficientFunds`], [`KeyNotFound`];
//! - deployment problems: [`Configuration`], [`Hashing`];
//! - storage failures: [`Database`].
//!
//! Only the last two groups are unexpected; see [`EngineError::is_internal`].
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`EmptyInput`]: EngineError::EmptyInput
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`DuplicateEmail`]: EngineError::DuplicateEmail
//!  [`InvalidCredentials`]: EngineError::InvalidCredentials
//!  [`InvalidToken`]: EngineError::InvalidToken
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Configuration`]: EngineError::Configuration
//!  [`Hashing`]: EngineError::Hashing
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Empty input: {0}")]
    EmptyInput(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("\"{0}\" already registered!")]
    DuplicateEmail(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Hashing error: {0}")]
    Hashing(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for failures that are not the caller's fault.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Hashing(_) | Self::Database(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::EmptyInput(a), Self::EmptyInput(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::DuplicateEmail(a), Self::DuplicateEmail(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::InvalidToken(a), Self::InvalidToken(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Configuration(a), Self::Configuration(b)) => a == b,
            (Self::Hashing(a), Self::Hashing(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
