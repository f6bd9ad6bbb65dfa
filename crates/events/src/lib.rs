//! `billdesk-events` — event abstractions shared by the billing domain.
//!
//! Contains the event/command traits, the envelope type that carries stream
//! metadata, the pub/sub bus boundary, and the projection contract. No storage
//! or transport assumptions live here.

pub mod bus;
pub mod command;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod projection;

pub use bus::{EventBus, Subscription};
pub use command::Command;
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use projection::Projection;
