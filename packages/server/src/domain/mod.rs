//! Domain layer for the notification fan-out subsystem.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod event;
pub mod registry;
pub mod value_object;

pub use entity::Connection;
pub use error::{RegistryError, ValueObjectError};
pub use event::{DomainEvent, EventContext, EventKind, Target, TargetSpec};
pub use registry::{ConnectionRegistry, DeliveryReceipt, RegistrySnapshot};
pub use value_object::{ChannelName, CohortId, ConnectionId, Identity, Role, Timestamp, UserId};
