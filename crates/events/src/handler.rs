/// Execute an aggregate command deterministically (no IO, no async).
///
/// Combines decision and state evolution in one step:
///
/// 1. **Decide**: `aggregate.handle(command)` returns events (pure, no mutation)
/// 2. **Evolve**: each event is folded back in via `aggregate.apply(event)`
///
/// The aggregate maintains its own version tracking during `apply()`,
/// typically +1 per event.
///
/// Use this for unit tests and inline processing that doesn't need
/// persistence; the full pipeline (append to the log, publish to the bus)
/// lives in the infra dispatcher.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: billdesk_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
