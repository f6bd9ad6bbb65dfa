//! Event publishing/subscription abstraction (mechanics only).
//!
//! This module provides the pub/sub seam that fans committed events out to
//! read-model builders (the invoice table, the client directory, the
//! dashboard totals).
//!
//! ## Design Philosophy
//!
//! The bus is intentionally **lightweight** and makes minimal assumptions:
//!
//! - **Transport-agnostic**: the contract fits in-memory channels today and a
//!   broker later without touching consumers
//! - **At-least-once delivery**: the same event may arrive more than once;
//!   consumers must be idempotent
//! - **No persistence**: the bus distributes events, the event log stores them
//!
//! At-least-once is acceptable here because events land in the append-only log
//! before publication, so a consumer that sees a duplicate can detect it by
//! sequence number and a consumer that missed an event can rebuild from the
//! log.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to an event stream.
///
/// Each subscription receives a copy of every message published after it was
/// created (broadcast semantics). Subscriptions are designed for
/// single-threaded consumption: hand one to each consumer thread.
///
/// ```ignore
/// let sub = bus.subscribe();
/// loop {
///     match sub.recv_timeout(Duration::from_secs(1)) {
///         Ok(envelope) => project(envelope)?,
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// The bus sits between the event log and event consumers:
///
/// ```text
/// Command → Event Log (append) → Event Bus (publish) → Consumers
///                                                          ├─ Invoice records
///                                                          ├─ Client directory
///                                                          └─ Dashboard totals
/// ```
///
/// Events are **appended first**, then **published**. If publication fails the
/// facts are still in the log and can be republished or replayed, so nothing
/// is lost.
///
/// ## Delivery Guarantees
///
/// At-least-once: messages may be delivered more than once, and ordering
/// across concurrent publishers is whatever the implementation provides.
/// Consumers guard with per-stream sequence numbers.
///
/// ## Error Handling
///
/// `publish()` can fail; the failure surfaces to the caller (typically the
/// command dispatcher), which can retry safely because the append already
/// happened.
///
/// The trait requires `Send + Sync`; implementations are shared across
/// threads behind an `Arc`.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
