//! Error types for the access gate

use thiserror::Error;

/// Reasons a caller is refused access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Please log in first.")]
    MissingToken,

    #[error("Session is not valid. Please log in first.")]
    InvalidToken,
}

pub type Result<T> = std::result::Result<T, GateError>;
