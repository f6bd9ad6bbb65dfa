//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Entities are tracked by identifier, not by value: a task whose status moved
/// from "ongoing" to "complete" is still the same task.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
