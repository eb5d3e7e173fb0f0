use std::any::Any;

use crate::event::Event;

/// Name of the event emitted once the kernel starts running
pub const START: &str = "start";
/// Name of the event emitted once the kernel has shut down
pub const QUIT: &str = "quit";
/// Name of the event emitted after each completed render cycle
pub const RENDER: &str = "render";
/// Name of the event emitted when the terminal dimensions change
pub const RESIZE: &str = "resize";

/// Events emitted by the kernel itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelEvent {
    /// The kernel transitioned to running
    Start,
    /// The kernel finished shutting down
    Quit,
    /// A render cycle completed
    Render,
    /// The terminal was resized
    Resize { width: u16, height: u16 },
}

impl Event for KernelEvent {
    fn name(&self) -> &str {
        match self {
            KernelEvent::Start => START,
            KernelEvent::Quit => QUIT,
            KernelEvent::Render => RENDER,
            KernelEvent::Resize { .. } => RESIZE,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Free-form event published by plugins
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    /// Name of the event
    pub name: String,
    /// Source plugin identifier
    pub source: String,
    /// Event payload
    pub payload: serde_json::Value,
}

impl CustomEvent {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            payload,
        }
    }
}

impl Event for CustomEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
