//! Domain layer for CallTurn
//!
//! Contains the call session model, the turn state machine, value objects,
//! and domain errors. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod speech;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
