use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use thiserror::Error;

use crate::plugin_system::traits::HookResult;

/// Identifies which plugin (or root node) callback was running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Install,
    Destroy,
    BeforeRender,
    Render,
    AfterRender,
    Resize,
    Dispose,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Install => "install",
            HookKind::Destroy => "destroy",
            HookKind::BeforeRender => "before_render",
            HookKind::Render => "render",
            HookKind::AfterRender => "after_render",
            HookKind::Resize => "on_resize",
            HookKind::Dispose => "dispose",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hook failure isolated by the kernel and kept for inspection.
///
/// Only the rendered message is retained so the value can be cloned and
/// compared; the original error is logged when it is captured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error in \"{plugin}\" {hook}: {message}")]
pub struct CapturedError {
    pub plugin: String,
    pub hook: HookKind,
    pub message: String,
}

impl CapturedError {
    pub fn new(plugin: impl Into<String>, hook: HookKind, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

/// Run a plugin-authored callback, turning a panic into an ordinary error.
pub fn guard<F>(f: F) -> HookResult
where
    F: FnOnce() -> HookResult,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic_obj) => Err(format!("panic: {}", panic_message(panic_obj.as_ref())).into()),
    }
}

/// Await a plugin-authored future, turning a panic while polling it into an
/// ordinary error.
pub async fn guard_async<Fut>(fut: Fut) -> HookResult
where
    Fut: Future<Output = HookResult>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic_obj) => Err(format!("panic: {}", panic_message(panic_obj.as_ref())).into()),
    }
}

fn panic_message(panic_obj: &(dyn Any + Send)) -> String {
    if let Some(s_ref) = panic_obj.downcast_ref::<&'static str>() {
        (*s_ref).to_string()
    } else if let Some(s_obj) = panic_obj.downcast_ref::<String>() {
        s_obj.clone()
    } else {
        "Unknown panic reason".to_string()
    }
}
