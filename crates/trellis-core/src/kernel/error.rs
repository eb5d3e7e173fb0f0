//! # Trellis Core Kernel Errors
//!
//! Defines error types specific to the Trellis Kernel.
//!
//! [`Error`] aggregates the typed errors of each subsystem so that kernel
//! entry points such as `start()`, `use_plugin()` and `run()` return a single
//! [`Result`] type. Only failures that would leave the install order in an
//! ambiguous state reach the caller; steady-state hook failures are captured
//! on the application instead.
use std::result::Result as StdResult;

use crate::config::error::ConfigError;
use crate::event::error::EventSystemError;
use crate::plugin_system::error::PluginSystemError;
use thiserror::Error as ThisError;

/// Custom error type for the Trellis kernel
#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("Event system error: {0}")]
    EventSystem(#[from] EventSystemError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        message: String,
    },
}

/// Represents a specific phase in the kernel's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Start")]
    Start,
    #[error("Run")]
    Run,
}

impl Error {
    /// Error code of the underlying plugin system error, if any
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::PluginSystem(e) => Some(e.code()),
            _ => None,
        }
    }
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
