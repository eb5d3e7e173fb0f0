//! # Trellis Core Host Boundary
//!
//! The contracts the kernel needs from whatever owns the terminal: a size
//! query, resize and termination notifications, and a factory for render
//! targets. [`StdTerminalHost`] implements them for a real terminal;
//! embedders and tests provide their own.
//!
//! Notifications travel to the kernel over an unbounded channel so that
//! signal tasks never touch kernel state directly. The kernel drains the
//! channel from its run loop (or from [`Application::pump`]).
//!
//! [`Application::pump`]: crate::kernel::bootstrap::Application::pump
pub mod terminal;

use std::fmt;
use std::io;

use tokio::sync::mpsc;

use crate::surface::{CellBuffer, RenderTarget};

pub use terminal::StdTerminalHost;

/// A message from the host to the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostNotification {
    /// The terminal may have changed size; the kernel re-queries it
    Resize,
    /// A termination signal arrived
    Terminate,
    /// Someone holding a [`QuitHandle`](crate::kernel::lifecycle::QuitHandle) asked to stop
    QuitRequested,
}

pub type NotificationSender = mpsc::UnboundedSender<HostNotification>;
pub type NotificationReceiver = mpsc::UnboundedReceiver<HostNotification>;

/// Cancels a host subscription when consumed or dropped
pub struct HostSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl HostSubscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for HostSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for HostSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// What the kernel needs from the terminal it runs in
pub trait TerminalHost: Send {
    /// Current terminal size as `(width, height)`
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Start sending [`HostNotification::Resize`] when the terminal resizes
    fn subscribe_resize(&mut self, notify: NotificationSender) -> HostSubscription;

    /// Start sending [`HostNotification::Terminate`] on termination signals
    fn on_termination_signal(&mut self, notify: NotificationSender) -> HostSubscription;

    /// Create a render target of the given size
    fn create_buffer(&self, width: u16, height: u16) -> Box<dyn RenderTarget> {
        Box::new(CellBuffer::new(width, height))
    }
}
