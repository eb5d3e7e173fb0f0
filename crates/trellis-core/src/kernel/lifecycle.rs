use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};

use crate::event::KernelEvent;
use crate::host::{HostNotification, NotificationReceiver, NotificationSender};
use crate::kernel::bootstrap::Application;
use crate::kernel::constants::APP_NAME;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::hooks::{guard, guard_async};
use crate::plugin_system::{HookResult, Plugin};

/// Identifier returned when registering a quit handler
pub type QuitHandlerId = u64;

/// Shutdown callback run by `quit()`.
///
/// Handlers run one at a time in registration order; each is awaited before
/// the next starts. A failing or panicking handler is logged and the rest
/// still run.
#[async_trait]
pub trait QuitHandler: Send + Sync {
    async fn on_quit(&self) -> HookResult;
}

/// [`QuitHandler`] backed by a closure returning a future
pub struct FnQuitHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> QuitHandler for FnQuitHandler<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    async fn on_quit(&self) -> HookResult {
        (self.f)().await
    }
}

impl<F> fmt::Debug for FnQuitHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnQuitHandler").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`QuitHandler`]
pub fn quit_handler_fn<F, Fut>(f: F) -> FnQuitHandler<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    FnQuitHandler { f }
}

/// Clonable request to stop a running kernel.
///
/// The request is delivered through the host channel and acted on by
/// `run()` or `pump()`. A request made while idle is discarded by the next
/// `start()`.
#[derive(Debug, Clone)]
pub struct QuitHandle {
    tx: NotificationSender,
}

impl QuitHandle {
    pub(super) fn new(tx: NotificationSender) -> Self {
        Self { tx }
    }

    /// Returns false if the kernel has been dropped
    pub fn request_quit(&self) -> bool {
        self.tx.send(HostNotification::QuitRequested).is_ok()
    }
}

impl Application {
    /// Resolve, install and start rendering. A no-op while running.
    ///
    /// Quit and termination requests that arrived while idle are discarded.
    ///
    /// Fails without installing anything if a dependency is missing or the
    /// graph has a cycle. An `install` failure aborts the remaining installs;
    /// plugins installed before it stay installed and are skipped on the
    /// next attempt.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            log::debug!("start() called while already running");
            return Ok(());
        }
        if self.starting {
            return Err(Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Start,
                message: "start() called from a plugin install hook".to_string(),
            });
        }

        if let Some(mut notifications) = self.notifications_rx.take() {
            self.discard_stale_notifications(&mut notifications);
            self.notifications_rx = Some(notifications);
        }

        let resolution = self.registry.resolve()?;
        log::debug!("Resolved install order: {:?}", resolution.names());
        for warning in &resolution.warnings {
            log::warn!("{}", warning);
        }
        self.warnings = resolution.warnings;

        self.starting = true;
        let installed = self.install_all(&resolution.order);
        self.starting = false;
        installed?;

        self.host_subscriptions.push(self.host.subscribe_resize(self.notifications_tx.clone()));
        self.host_subscriptions
            .push(self.host.on_termination_signal(self.notifications_tx.clone()));

        self.mark_dirty();
        self.running = true;
        log::info!(
            "{} started with {} plugin(s) at {:?} per frame",
            APP_NAME,
            self.registry.installed_count(),
            self.scheduler.period()
        );
        self.events.emit(&KernelEvent::Start);
        Ok(())
    }

    /// Empty the host channel before a run begins. Stop requests belong to
    /// a run that is already over; a pending resize is still applied.
    fn discard_stale_notifications(&mut self, notifications: &mut NotificationReceiver) {
        let mut resized = false;
        let mut dropped = 0;
        while let Ok(notification) = notifications.try_recv() {
            match notification {
                HostNotification::Resize => resized = true,
                HostNotification::Terminate | HostNotification::QuitRequested => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!("Discarded {} stop request(s) received while idle", dropped);
        }
        if resized {
            self.check_resize();
        }
    }

    fn install_all(&mut self, order: &[Arc<dyn Plugin>]) -> Result<()> {
        for plugin in order {
            if self.registry.is_installed(plugin.name()) {
                continue;
            }
            self.install_one(Arc::clone(plugin))?;
        }
        Ok(())
    }

    fn install_one(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        log::info!("Installing plugin \"{}\"", plugin.name());
        guard(|| plugin.install(self)).map_err(|source| PluginSystemError::InstallFailed {
            plugin_id: plugin.name().to_string(),
            source,
        })?;
        self.registry.mark_installed(plugin);
        Ok(())
    }

    /// Add a plugin after construction.
    ///
    /// While running the plugin is installed immediately, without ordering
    /// against the others. While idle it is queued for the next `start()`.
    pub fn use_plugin(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        self.registry.register(Arc::clone(&plugin));
        if !self.running {
            log::debug!("Queued plugin \"{}\" for the next start", plugin.name());
            return Ok(());
        }
        if self.registry.is_installed(plugin.name()) {
            log::warn!(
                "Plugin \"{}\" is already installed; not installing it again",
                plugin.name()
            );
            return Ok(());
        }
        self.install_one(plugin)?;
        self.mark_dirty();
        Ok(())
    }

    /// Register a shutdown callback. Handlers stay registered across runs.
    pub fn on_quit(&mut self, handler: impl QuitHandler + 'static) -> QuitHandlerId {
        let id = self.next_quit_handler_id;
        self.next_quit_handler_id += 1;
        self.quit_handlers.push((id, Box::new(handler)));
        id
    }

    pub fn remove_quit_handler(&mut self, id: QuitHandlerId) -> bool {
        let before = self.quit_handlers.len();
        self.quit_handlers.retain(|(h_id, _)| *h_id != id);
        self.quit_handlers.len() < before
    }

    /// Shut down. A no-op while idle.
    ///
    /// Quit handlers are drained in order, host subscriptions cancelled,
    /// then plugins destroyed in reverse install order. Failures along the
    /// way are logged and never stop the teardown.
    pub async fn quit(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        log::info!("Shutting down {}", APP_NAME);

        for (id, handler) in &self.quit_handlers {
            if let Err(e) = guard_async(handler.on_quit()).await {
                log::error!("Quit handler {} failed: {}", id, e);
            }
        }

        for subscription in self.host_subscriptions.drain(..) {
            subscription.cancel();
        }

        let installed = self.registry.installed().to_vec();
        for plugin in installed.iter().rev() {
            log::debug!("Destroying plugin \"{}\"", plugin.name());
            if let Err(e) = guard(|| plugin.destroy()) {
                log::error!("Error in \"{}\" destroy: {}", plugin.name(), e);
            }
        }
        self.registry.clear_installed();

        self.events.emit(&KernelEvent::Quit);
        log::info!("{} stopped", APP_NAME);
    }

    /// Start the kernel and drive it until it quits.
    ///
    /// Each iteration waits for the periodic tick, an immediate render
    /// request or a host notification. Termination signals and
    /// [`QuitHandle::request_quit`] end the loop through `quit()`.
    pub async fn run(&mut self) -> Result<()> {
        let mut notifications =
            self.notifications_rx.take().ok_or_else(|| Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Run,
                message: "run() is already driving this application".to_string(),
            })?;
        let result = self.run_loop(&mut notifications).await;
        self.notifications_rx = Some(notifications);
        result
    }

    async fn run_loop(&mut self, notifications: &mut NotificationReceiver) -> Result<()> {
        if !self.running {
            self.discard_stale_notifications(notifications);
        }
        self.start()?;

        let mut ticker = time::interval(self.scheduler.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let render_requested = self.scheduler.handle().notifier();

        while self.running {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                _ = render_requested.notified() => {
                    self.tick();
                }
                Some(notification) = notifications.recv() => {
                    self.handle_notification(notification).await;
                }
            }
        }
        Ok(())
    }

    /// Handle every queued host notification without waiting for more.
    /// Returns how many were handled.
    pub async fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let next = match self.notifications_rx.as_mut() {
                Some(rx) => rx.try_recv().ok(),
                None => None,
            };
            let Some(notification) = next else {
                break;
            };
            self.handle_notification(notification).await;
            handled += 1;
        }
        handled
    }

    async fn handle_notification(&mut self, notification: HostNotification) {
        log::debug!("Host notification: {:?}", notification);
        match notification {
            HostNotification::Resize => {
                self.check_resize();
            }
            HostNotification::Terminate | HostNotification::QuitRequested => self.quit().await,
        }
    }
}
