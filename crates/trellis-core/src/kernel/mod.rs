//! # Trellis Core Kernel
//!
//! The `kernel` module is the heart of `trellis-core`. It owns the single
//! [`Application`] instance and drives it from construction to shutdown.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Application State**: [`Application`](bootstrap::Application) in the
//!   `bootstrap` submodule holds the plugin registry, root node, render
//!   target, event bus and captured errors.
//! - **Lifecycle**: `start()`, `use_plugin()`, `quit()` and the async `run()`
//!   loop live in `lifecycle`, together with [`QuitHandler`](lifecycle::QuitHandler)
//!   and [`QuitHandle`](lifecycle::QuitHandle).
//! - **Render Scheduling**: the dirty flag, [`RenderHandle`](render::RenderHandle),
//!   [`Frame`](render::Frame) and the isolated render cycle live in `render`.
//! - **Resize Coordination**: `check_resize()` and `resize_to()` in `resize`.
//! - **Error Handling**: [`Error`](error::Error) and the `Result` alias.
//! - **Core Constants**: defaults in `constants`.
pub mod bootstrap;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod render;
pub mod resize;

pub use bootstrap::Application;
pub use error::{Error, Result};
pub use lifecycle::{FnQuitHandler, QuitHandle, QuitHandler, QuitHandlerId, quit_handler_fn};
pub use render::{Frame, RenderHandle, RenderScheduler};

// Test module declaration
#[cfg(test)]
mod tests;
