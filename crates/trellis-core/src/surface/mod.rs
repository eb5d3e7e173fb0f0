//! # Trellis Core Surface
//!
//! The drawing side of the kernel: the render target a frame is painted into
//! and the node tree mounted at the root of the application.
//!
//! The kernel does not know how nodes lay themselves out or paint; it only
//! hands the mounted root and the current target to plugins during a render
//! cycle and disposes the root when it is replaced.
pub mod buffer;

use std::any::Any;

use crate::config::theme::Theme;
use crate::plugin_system::traits::HookResult;

pub use buffer::{Cell, CellBuffer};

/// Something a frame can be drawn into, sized to the terminal
pub trait RenderTarget: Send {
    fn width(&self) -> u16;

    fn height(&self) -> u16;

    /// Cast to Any for downcasting to the concrete buffer
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A renderable tree mounted as the application root
pub trait Node: Send + Sync {
    /// Paint this node (and its children) into `target`
    fn render(&self, target: &mut dyn RenderTarget, theme: &Theme) -> HookResult;

    /// Release resources held by the tree. Called when the root is replaced
    /// or disposed.
    fn dispose(&self) -> HookResult {
        Ok(())
    }
}
