use crate::event::KernelEvent;
use crate::kernel::bootstrap::Application;
use crate::plugin_system::hooks::{HookKind, guard};

impl Application {
    /// Query the host for the terminal size and apply it.
    ///
    /// A failed query is logged and treated as "unchanged".
    pub fn check_resize(&mut self) -> bool {
        match self.host.size() {
            Ok((width, height)) => self.resize_to(width, height),
            Err(e) => {
                log::warn!("Terminal size query failed during resize: {}", e);
                false
            }
        }
    }

    /// Apply a reported terminal size. Returns false when it matches the
    /// current dimensions, in which case nothing else happens.
    ///
    /// Otherwise the render target is replaced with a freshly sized one,
    /// every installed plugin's `on_resize` hook runs (isolated like the
    /// render hooks), `resize` is emitted and a render is requested.
    pub fn resize_to(&mut self, width: u16, height: u16) -> bool {
        if (width, height) == (self.width, self.height) {
            return false;
        }
        log::debug!("Resizing from {}x{} to {}x{}", self.width, self.height, width, height);

        self.width = width;
        self.height = height;
        self.render_target = self.host.create_buffer(width, height);
        self.mark_dirty();

        let plugins = self.registry.installed().to_vec();
        for plugin in &plugins {
            let result = guard(|| plugin.on_resize(width, height));
            self.capture(plugin.name(), HookKind::Resize, result);
        }

        self.events.emit(&KernelEvent::Resize { width, height });
        self.scheduler.handle().request_render();
        true
    }
}
