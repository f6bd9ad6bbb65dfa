use billdesk_core::AggregateId;

/// A command targets a specific aggregate (command abstraction).
///
/// Commands represent **intent** - a request to perform an action on an
/// aggregate. They are **transient** (not persisted) and are transformed into
/// events (which are persisted).
///
/// ## Command vs Event
///
/// - **Command**: intent to do something (e.g., "Issue this invoice")
/// - **Event**: fact that something happened (e.g., "InvoiceIssued { ... }")
///
/// Commands are rejected if invalid (validation errors). Events represent
/// accepted changes.
///
/// ## Aggregate Targeting
///
/// Commands name the aggregate they act on via `target_aggregate_id()`, which
/// lets infrastructure route the command to the right stream and keeps each
/// command inside one consistency boundary. Identity and audit data (who,
/// when) ride on the command itself; the domain layer never invents either.
///
/// ## Design Constraints
///
/// Commands must be:
/// - **Cloneable**: commands may be copied for retries and logging
/// - **Send + Sync + 'static**: commands cross thread boundaries and own all
///   their data
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_aggregate_id(&self) -> AggregateId;
}
