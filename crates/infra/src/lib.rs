//! Infrastructure layer: event log, dispatch, read models, board widgets.
//!
//! Everything here composes the pure domain crates with storage-shaped
//! abstractions. The only concrete backends are in-memory; the traits are the
//! seams where durable ones would plug in.

pub mod command_dispatcher;
pub mod event_log;
pub mod projections;
pub mod read_model;
pub mod search;
pub mod tasks;

#[cfg(test)]
mod integration_tests;
