//! Clients domain module (the billing client registry, event-sourced).
//!
//! This crate contains business rules for clients of the billing office,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod client;

pub use client::{
    Client, ClientCommand, ClientDetailsUpdated, ClientEvent, ClientId, ClientRegistered,
    ContactInfo, RegisterClient, UpdateClientDetails,
};
