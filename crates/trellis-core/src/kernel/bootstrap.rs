use std::fmt;
use std::sync::{Arc, Weak};

use tokio::sync::mpsc;

use crate::config::{KernelConfig, Theme};
use crate::event::{
    DispatchReport, Event, EventId, HandlerResult, SharedEventDispatcher, Subscription,
};
use crate::host::{HostSubscription, NotificationReceiver, NotificationSender, TerminalHost};
use crate::kernel::constants::{self, ROOT_NODE_NAME};
use crate::kernel::lifecycle::{QuitHandle, QuitHandler, QuitHandlerId};
use crate::kernel::render::RenderScheduler;
use crate::plugin_system::hooks::{CapturedError, HookKind, guard};
use crate::plugin_system::{Plugin, PluginRegistry, ResolutionWarning};
use crate::surface::{Node, RenderTarget};

/// The application kernel.
///
/// Owns the plugin registry, the mounted root node, the render target and
/// the event bus, and drives them through the lifecycle in
/// [`lifecycle`](crate::kernel::lifecycle), the render scheduler in
/// [`render`](crate::kernel::render) and the resize coordinator in
/// [`resize`](crate::kernel::resize).
///
/// All kernel state is mutated through `&mut self`; the only things shared
/// with other tasks are the [`RenderHandle`](crate::kernel::render::RenderHandle),
/// the [`QuitHandle`] and the host notification channel.
pub struct Application {
    pub(super) config: KernelConfig,
    pub(super) theme: Theme,
    pub(super) host: Box<dyn TerminalHost>,
    pub(super) registry: PluginRegistry,
    pub(super) running: bool,
    /// Set while `start()` is installing plugins
    pub(super) starting: bool,
    pub(super) root: Option<Arc<dyn Node>>,
    pub(super) focused: Option<Weak<dyn Node>>,
    pub(super) width: u16,
    pub(super) height: u16,
    pub(super) render_target: Box<dyn RenderTarget>,
    pub(super) scheduler: RenderScheduler,
    pub(super) last_error: Option<CapturedError>,
    pub(super) events: SharedEventDispatcher,
    pub(super) quit_handlers: Vec<(QuitHandlerId, Box<dyn QuitHandler>)>,
    pub(super) next_quit_handler_id: QuitHandlerId,
    pub(super) notifications_tx: NotificationSender,
    /// Taken by `run()` for the duration of the loop
    pub(super) notifications_rx: Option<NotificationReceiver>,
    pub(super) host_subscriptions: Vec<HostSubscription>,
    pub(super) warnings: Vec<ResolutionWarning>,
}

impl Application {
    /// Creates a kernel bound to `host`.
    ///
    /// The initial dimensions come from the host's size query, falling back
    /// to `config.default_size` if the query fails.
    pub fn new(host: impl TerminalHost + 'static, config: KernelConfig) -> Self {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);

        let (width, height) = match host.size() {
            Ok(size) => size,
            Err(e) => {
                let (w, h) = config.default_size;
                log::warn!("Terminal size query failed ({}); falling back to {}x{}", e, w, h);
                (w, h)
            }
        };
        let render_target = host.create_buffer(width, height);
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();

        Application {
            theme: config.resolved_theme(),
            scheduler: RenderScheduler::new(config.frame_interval()),
            config,
            host: Box::new(host),
            registry: PluginRegistry::new(),
            running: false,
            starting: false,
            root: None,
            focused: None,
            width,
            height,
            render_target,
            last_error: None,
            events: SharedEventDispatcher::new(),
            quit_handlers: Vec::new(),
            next_quit_handler_id: 1,
            notifications_tx,
            notifications_rx: Some(notifications_rx),
            host_subscriptions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a kernel seeded with `plugins`, in the given order
    pub fn with_plugins<I>(
        host: impl TerminalHost + 'static,
        config: KernelConfig,
        plugins: I,
    ) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        let mut app = Self::new(host, config);
        for plugin in plugins {
            app.register(plugin);
        }
        app
    }

    /// Add a plugin to the set resolved by the next `start()`.
    ///
    /// Unlike [`use_plugin`](Self::use_plugin) this never installs
    /// immediately, even while running.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        log::debug!("Registering plugin \"{}\"", plugin.name());
        self.registry.register(plugin);
    }

    // --- Root node ---

    /// Replace the root node, disposing the previous one
    pub fn mount(&mut self, node: impl Node + 'static) {
        if self.root.is_some() {
            self.dispose_root();
        }
        self.root = Some(Arc::new(node));
        self.mark_dirty();
    }

    /// Dispose and forget the root node. Focus is cleared even if disposal fails.
    pub fn dispose_root(&mut self) {
        self.focused = None;
        if let Some(root) = self.root.take() {
            let result = guard(|| root.dispose());
            self.capture(ROOT_NODE_NAME, HookKind::Dispose, result);
            self.mark_dirty();
        }
    }

    pub fn root(&self) -> Option<&dyn Node> {
        self.root.as_deref()
    }

    /// Remember `node` as focused without taking ownership of it
    pub fn focus(&mut self, node: &Arc<dyn Node>) {
        self.focused = Some(Arc::downgrade(node));
        self.mark_dirty();
    }

    /// Focus the mounted root. Returns false if nothing is mounted.
    pub fn focus_root(&mut self) -> bool {
        match self.root.as_ref().map(Arc::downgrade) {
            Some(weak) => {
                self.focused = Some(weak);
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    /// The focused node, if it is still alive
    pub fn focused(&self) -> Option<Arc<dyn Node>> {
        self.focused.as_ref().and_then(Weak::upgrade)
    }

    // --- Accessors ---

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn render_target(&self) -> &dyn RenderTarget {
        self.render_target.as_ref()
    }

    pub fn render_target_mut(&mut self) -> &mut dyn RenderTarget {
        self.render_target.as_mut()
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Names of installed plugins, in install order
    pub fn installed_plugins(&self) -> Vec<String> {
        self.registry.installed().iter().map(|p| p.name().to_string()).collect()
    }

    /// Names of registered plugins not installed in the current run
    pub fn pending_plugins(&self) -> Vec<String> {
        self.registry.pending().iter().map(|p| p.name().to_string()).collect()
    }

    /// Warnings produced by the most recent resolution
    pub fn resolution_warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }

    // --- Captured errors ---

    /// The most recent isolated hook or dispose failure
    pub fn error(&self) -> Option<&CapturedError> {
        self.last_error.as_ref()
    }

    /// Forget the captured error and schedule a redraw
    pub fn clear_error(&mut self) {
        self.last_error = None;
        self.mark_dirty();
    }

    /// Log and record a failed hook. Successful results are ignored.
    pub(super) fn capture(
        &mut self,
        plugin: &str,
        hook: HookKind,
        result: crate::plugin_system::HookResult,
    ) {
        if let Err(e) = result {
            log::error!("Error in \"{}\" {}: {}", plugin, hook, e);
            self.last_error = Some(CapturedError::new(plugin, hook, e.to_string()));
        }
    }

    // --- Event bus ---

    /// The kernel's event bus, clonable for use from handlers
    pub fn events(&self) -> &SharedEventDispatcher {
        &self.events
    }

    pub fn on<F>(&self, event_name: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.events.on(event_name, handler)
    }

    pub fn on_type<E, F>(&self, handler: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.events.on_type::<E, F>(handler)
    }

    pub fn off(&self, id: EventId) -> bool {
        self.events.off(id)
    }

    pub fn emit(&self, event: &dyn Event) -> DispatchReport {
        self.events.emit(event)
    }

    // --- Host channel ---

    /// Handle that asks a running kernel to shut down
    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle::new(self.notifications_tx.clone())
    }

    /// Sender for hosts that deliver notifications themselves
    pub fn notifier(&self) -> NotificationSender {
        self.notifications_tx.clone()
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("running", &self.running)
            .field("dimensions", &(self.width, self.height))
            .field("registry", &self.registry)
            .field("root_mounted", &self.root.is_some())
            .field("dirty", &self.is_dirty())
            .field("last_error", &self.last_error)
            .field("quit_handlers", &self.quit_handlers.len())
            .finish_non_exhaustive()
    }
}
