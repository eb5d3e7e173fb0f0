//! # Trellis Core Event System
//!
//! A synchronous publish/subscribe bus used by the kernel and by plugins to
//! observe lifecycle and input events.
//!
//! Handlers are registered per event name (or per concrete event type) and
//! run in registration order. Each handler is isolated: a handler that
//! returns an error or panics is logged and skipped, and its siblings still
//! run.
pub mod dispatcher;
pub mod error;
pub mod types;

use std::any::Any;
use std::fmt;

use crate::plugin_system::traits::BoxError;

/// Type for event handler identifiers
pub type EventId = u64;

/// Result returned by an event handler
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Core event trait
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Get the name of this event
    fn name(&self) -> &str;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Re-export important types
pub use dispatcher::{DispatchReport, EventDispatcher, SharedEventDispatcher, Subscription};
pub use error::EventSystemError;
pub use types::{CustomEvent, KernelEvent};
