//! # Trellis Core Event System Errors
//!
//! Defines error types specific to the Trellis Event System.
//!
//! Handler failures never propagate out of a dispatch; they are collected as
//! [`EventSystemError`] values in the
//! [`DispatchReport`](crate::event::DispatchReport) so callers and tests can
//! inspect them.
use crate::event::EventId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventSystemError {
    #[error("Event handler {handler_id} failed while handling '{event_name}': {reason}")]
    HandlerFailed {
        event_name: String,
        handler_id: EventId,
        reason: String,
    },

    #[error("Failed to unregister event handler with ID {id}: {reason}")]
    HandlerUnregistrationFailed { id: EventId, reason: String },
}
