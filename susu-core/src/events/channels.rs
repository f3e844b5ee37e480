//! Event channel factories and handles.
//!
//! Provides factory functions for creating event channels with appropriate
//! buffer sizes for the event-driven architecture.

use super::types::PoolEvent;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for PoolEvent events.
pub type PoolEventSender = mpsc::Sender<PoolEvent>;
/// Receiver handle for PoolEvent events.
pub type PoolEventReceiver = mpsc::Receiver<PoolEvent>;

/// Create a new PoolEvent channel.
///
/// Returns a (sender, receiver) pair for PoolEvent events.
/// Multiple senders can be cloned from the returned sender.
pub fn pool_event_channel() -> (PoolEventSender, PoolEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Container for all event channel senders.
///
/// This provides a convenient way to pass around all event senders
/// to components that need to emit events.
#[derive(Clone)]
pub struct EventSenders {
    /// Sender for PoolEvent events
    pub pool_event: PoolEventSender,
}

impl EventSenders {
    /// Create a new EventSenders container.
    pub fn new(pool_event: PoolEventSender) -> Self {
        Self { pool_event }
    }

    /// Emit an event without blocking the transition that produced it.
    ///
    /// Events are best-effort: if the buffer is full or the receiver is
    /// gone, the event is dropped with a warning.
    pub fn emit(&self, event: PoolEvent) {
        if let Err(err) = self.pool_event.try_send(event) {
            tracing::warn!("dropping pool event: {err}");
        }
    }
}
