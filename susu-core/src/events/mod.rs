//! Event system for the event-driven architecture.
//!
//! This module provides event types and channel infrastructure for
//! observing pool transitions asynchronously. Every committed transition
//! emits a [`PoolEvent`]; delivery is best-effort and never blocks or
//! fails the transition itself.
//!
//! All events are ephemeral - they carry identifiers and amounts rather
//! than full state, and subscribers re-query the engine.

pub mod channels;
pub mod types;

pub use channels::{
    pool_event_channel, EventSenders, PoolEventReceiver, PoolEventSender, DEFAULT_CHANNEL_BUFFER,
};

pub use types::PoolEvent;
