//! `billdesk-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod audit;
pub mod entity;
pub mod error;
pub mod id;
pub mod num;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use audit::AuditStamp;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::AggregateId;
pub use num::{lenient_f64, usable_percentage};
pub use value_object::ValueObject;
