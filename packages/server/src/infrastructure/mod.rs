//! Infrastructure layer: concrete implementations behind the domain traits,
//! credential verification and wire DTOs.

pub mod auth;
pub mod dto;
pub mod registry;

pub use auth::{AuthError, TokenVerifier};
pub use registry::InMemoryConnectionRegistry;
