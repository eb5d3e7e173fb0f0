//! # trellis-core
//!
//! Application kernel for the Trellis terminal UI toolkit: plugin
//! resolution and lifecycle, render scheduling with per-hook failure
//! isolation, resize coordination and an event bus.
pub mod config;
pub mod event;
pub mod host;
pub mod kernel;
pub mod plugin_system;
pub mod surface;

// Re-export key public types/traits for easier use by plugins and hosts
pub use config::{KernelConfig, Theme};
pub use event::{Event, KernelEvent, SharedEventDispatcher, Subscription};
pub use host::{HostNotification, StdTerminalHost, TerminalHost};
pub use kernel::error::Error as KernelError;
pub use kernel::{Application, Frame, QuitHandle, QuitHandler, RenderHandle, quit_handler_fn};
pub use plugin_system::{CapturedError, FnPlugin, HookResult, Plugin, PluginSystemError};
pub use surface::{CellBuffer, Node, RenderTarget};
