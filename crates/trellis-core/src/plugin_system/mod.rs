//! # Trellis Core Plugin System
//!
//! This module provides the infrastructure for extending a Trellis application
//! through statically registered plugins. It is responsible for describing
//! plugins, ordering them, and invoking their hooks without letting one
//! misbehaving plugin take down the rest of the UI.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: The [`Plugin`] capability trait every plugin implements and
//!   the closure-backed [`FnPlugin`] descriptor.
//! - **[`dependency`]**: The dependency resolver, which turns `dependencies`,
//!   `after` and `before` hints into a deterministic install order.
//! - **[`registry`]**: The [`PluginRegistry`] holding known (pending) and
//!   installed plugins.
//! - **[`hooks`]**: Hook identifiers, panic-safe invocation and the
//!   [`CapturedError`] recorded when a steady-state hook fails.
//! - **[`error`]**: [`PluginSystemError`], covering missing dependencies,
//!   circular dependencies and failed installs.
pub mod dependency;
pub mod error;
pub mod hooks;
pub mod registry;
pub mod traits;

pub use dependency::{Resolution, ResolutionWarning, resolve};
pub use error::PluginSystemError;
pub use hooks::{CapturedError, HookKind};
pub use registry::PluginRegistry;
pub use traits::{BoxError, FnPlugin, HookResult, Plugin};
