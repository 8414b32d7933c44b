//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("UserId must be a positive integer")]
    UserIdZero,

    /// CohortId validation error
    #[error("CohortId must be a positive integer")]
    CohortIdZero,

    /// Role parse error
    #[error("Unknown role '{0}' (expected 'student' or 'mentor')")]
    RoleUnknown(String),
}

/// Errors related to the Connection Registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The connection id is not (or no longer) registered
    #[error("Connection '{0}' is not registered")]
    ConnectionNotFound(ConnectionId),
}
