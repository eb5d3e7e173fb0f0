use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::config::Theme;
use crate::event::KernelEvent;
use crate::kernel::bootstrap::Application;
use crate::plugin_system::HookResult;
use crate::plugin_system::hooks::{HookKind, guard};
use crate::surface::{Node, RenderTarget};

/// Clonable handle onto the scheduler's coalescing flags.
///
/// Hooks and event handlers use it to request a redraw without access to
/// the [`Application`].
#[derive(Debug, Clone)]
pub struct RenderHandle {
    dirty: Arc<AtomicBool>,
    scheduled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl RenderHandle {
    fn new() -> Self {
        Self {
            dirty: Arc::new(AtomicBool::new(false)),
            scheduled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Mark the screen stale and ask for a render cycle
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        self.request_render();
    }

    /// Wake the run loop for an immediate cycle. Requests coalesce until the
    /// next cycle begins.
    pub fn request_render(&self) {
        if !self.scheduled.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }

    pub(super) fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }

    /// Drop a pending render request without starting a cycle. The dirty
    /// flag is kept.
    fn cancel_request(&self) {
        self.scheduled.store(false, Ordering::SeqCst);
    }

    /// Clear both flags ahead of running hooks, so that anything marked
    /// during the cycle lands in the next one.
    fn begin_cycle(&self) {
        self.scheduled.store(false, Ordering::SeqCst);
        self.dirty.store(false, Ordering::SeqCst);
    }
}

/// Periodic tick plus dirty/scheduled coalescing
#[derive(Debug)]
pub struct RenderScheduler {
    period: Duration,
    handle: RenderHandle,
}

impl RenderScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: RenderHandle::new(),
        }
    }

    /// Interval between ticks, `floor(1000 / fps)` milliseconds
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn handle(&self) -> &RenderHandle {
        &self.handle
    }
}

/// What a plugin's `render` hook gets to work with
pub struct Frame<'a> {
    root: &'a dyn Node,
    target: &'a mut dyn RenderTarget,
    theme: &'a Theme,
    handle: &'a RenderHandle,
}

impl<'a> Frame<'a> {
    pub fn new(
        root: &'a dyn Node,
        target: &'a mut dyn RenderTarget,
        theme: &'a Theme,
        handle: &'a RenderHandle,
    ) -> Self {
        Self {
            root,
            target,
            theme,
            handle,
        }
    }

    pub fn root(&self) -> &dyn Node {
        self.root
    }

    pub fn target(&self) -> &dyn RenderTarget {
        &*self.target
    }

    pub fn target_mut(&mut self) -> &mut dyn RenderTarget {
        &mut *self.target
    }

    pub fn theme(&self) -> &Theme {
        self.theme
    }

    pub fn render_handle(&self) -> &RenderHandle {
        self.handle
    }

    /// Paint the root node into the target with the current theme
    pub fn paint_root(&mut self) -> HookResult {
        self.root.render(&mut *self.target, self.theme)
    }
}

impl Application {
    /// Mark the screen stale. Harmless while idle; the tick only renders
    /// while running.
    pub fn mark_dirty(&self) {
        self.scheduler.handle().mark_dirty();
    }

    /// Same as [`mark_dirty`](Self::mark_dirty)
    pub fn refresh(&self) {
        self.mark_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.handle().is_dirty()
    }

    pub fn render_handle(&self) -> RenderHandle {
        self.scheduler.handle().clone()
    }

    /// One scheduler tick. Runs a render cycle if the screen is dirty, the
    /// kernel is running and a root is mounted; returns whether it did.
    ///
    /// Every hook invocation is isolated. A failure is logged and kept as
    /// the captured error, and the cycle carries on with the next hook.
    pub fn tick(&mut self) -> bool {
        if !self.is_dirty() || !self.running {
            return false;
        }
        let Some(root) = self.root.clone() else {
            // Nothing to paint; let the next mark_dirty wake the loop again
            self.scheduler.handle().cancel_request();
            return false;
        };

        self.scheduler.handle().begin_cycle();
        let handle = self.scheduler.handle().clone();
        let plugins = self.registry.installed().to_vec();

        for plugin in &plugins {
            let result = guard(|| plugin.before_render());
            self.capture(plugin.name(), HookKind::BeforeRender, result);
        }

        for plugin in &plugins {
            let result = {
                let target = self.render_target.as_mut();
                let mut frame = Frame::new(&*root, target, &self.theme, &handle);
                guard(|| plugin.render(&mut frame))
            };
            self.capture(plugin.name(), HookKind::Render, result);
        }

        for plugin in &plugins {
            let result = guard(|| plugin.after_render());
            self.capture(plugin.name(), HookKind::AfterRender, result);
        }

        self.events.emit(&KernelEvent::Render);
        true
    }
}
