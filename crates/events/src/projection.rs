use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// The write side records facts (invoice issued, client registered); the read
/// side wants denormalized rows (the billing table, the client directory, the
/// dashboard totals). Projections bridge the two:
///
/// - **Optimized queries**: rows are shaped for the page that renders them
/// - **Multiple views**: several projections can consume the same events
/// - **Disposability**: a read model can be thrown away and rebuilt by
///   replaying the log; the log is the source of truth
///
/// ## Lifecycle
///
/// 1. **Subscribe**: the projection takes a bus subscription (or a log replay)
/// 2. **Apply**: each event updates the read model through `apply()`
/// 3. **Query**: rows are read directly, no replay on the query path
/// 4. **Rebuild**: replay the full log into an empty store when the row shape
///    changes
///
/// ## Idempotency
///
/// Delivery is at-least-once, so `apply()` must tolerate seeing the same
/// envelope twice. The infra projections do this by tracking the last applied
/// `sequence_number` per stream and skipping anything at or below it.
///
/// ## Persistence
///
/// This trait doesn't say how read models are stored; that's an infrastructure
/// concern. The in-memory record stores are one implementation.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    ///
    /// Must be idempotent: applying the same envelope twice produces the same
    /// read model as applying it once.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
