use std::fmt;

use crate::kernel::bootstrap::Application;
use crate::kernel::render::Frame;

/// Boxed error type returned by plugin-authored callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single plugin hook invocation
pub type HookResult = std::result::Result<(), BoxError>;

/// Core trait that all plugins must implement.
///
/// Only [`Plugin::name`] and [`Plugin::install`] are mandatory. Every other
/// hook is an optional capability; a plugin that does not provide one keeps
/// the default, which does nothing and cannot fail.
///
/// Hooks take `&self`: plugins that need mutable state use interior
/// mutability, since the kernel shares them behind an `Arc`.
pub trait Plugin: Send + Sync {
    /// Unique plugin name. Two plugins with the same name replace each other.
    fn name(&self) -> &str;

    /// Plugins that must be installed before this one. A missing entry is fatal.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Plugins this one should be installed after, if they are present.
    fn after(&self) -> Vec<String> {
        Vec::new()
    }

    /// Plugins this one would like to precede. Dropped with a warning when
    /// honouring it would create a cycle.
    fn before(&self) -> Vec<String> {
        Vec::new()
    }

    /// Install the plugin into the application
    fn install(&self, app: &mut Application) -> HookResult;

    /// Release whatever `install` set up. Called in reverse install order.
    fn destroy(&self) -> HookResult {
        Ok(())
    }

    /// Called at the start of every render cycle
    fn before_render(&self) -> HookResult {
        Ok(())
    }

    /// Called once per render cycle with the mounted root and render target
    fn render(&self, _frame: &mut Frame<'_>) -> HookResult {
        Ok(())
    }

    /// Called at the end of every render cycle
    fn after_render(&self) -> HookResult {
        Ok(())
    }

    /// Called when the terminal dimensions change
    fn on_resize(&self, _width: u16, _height: u16) -> HookResult {
        Ok(())
    }
}

type InstallFn = Box<dyn Fn(&mut Application) -> HookResult + Send + Sync>;
type SimpleHookFn = Box<dyn Fn() -> HookResult + Send + Sync>;
type RenderFn = Box<dyn Fn(&mut Frame<'_>) -> HookResult + Send + Sync>;
type ResizeFn = Box<dyn Fn(u16, u16) -> HookResult + Send + Sync>;

/// A plugin assembled from closures.
///
/// ```ignore
/// let status = FnPlugin::new("status-bar", |app| {
///     app.on("resize", |_| Ok(()));
///     Ok(())
/// })
/// .with_dependency("theme")
/// .with_render(|frame| frame.paint_root());
/// ```
pub struct FnPlugin {
    name: String,
    dependencies: Vec<String>,
    after: Vec<String>,
    before: Vec<String>,
    install: InstallFn,
    destroy: Option<SimpleHookFn>,
    before_render: Option<SimpleHookFn>,
    render: Option<RenderFn>,
    after_render: Option<SimpleHookFn>,
    on_resize: Option<ResizeFn>,
}

impl FnPlugin {
    pub fn new<F>(name: impl Into<String>, install: F) -> Self
    where
        F: Fn(&mut Application) -> HookResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            after: Vec::new(),
            before: Vec::new(),
            install: Box::new(install),
            destroy: None,
            before_render: None,
            render: None,
            after_render: None,
            on_resize: None,
        }
    }

    /// A plugin whose install step does nothing
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, |_| Ok(()))
    }

    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn with_after(mut self, name: impl Into<String>) -> Self {
        self.after.push(name.into());
        self
    }

    pub fn with_before(mut self, name: impl Into<String>) -> Self {
        self.before.push(name.into());
        self
    }

    pub fn with_destroy<F>(mut self, f: F) -> Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.destroy = Some(Box::new(f));
        self
    }

    pub fn with_before_render<F>(mut self, f: F) -> Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.before_render = Some(Box::new(f));
        self
    }

    pub fn with_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Frame<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.render = Some(Box::new(f));
        self
    }

    pub fn with_after_render<F>(mut self, f: F) -> Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.after_render = Some(Box::new(f));
        self
    }

    pub fn with_resize<F>(mut self, f: F) -> Self
    where
        F: Fn(u16, u16) -> HookResult + Send + Sync + 'static,
    {
        self.on_resize = Some(Box::new(f));
        self
    }
}

impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn after(&self) -> Vec<String> {
        self.after.clone()
    }

    fn before(&self) -> Vec<String> {
        self.before.clone()
    }

    fn install(&self, app: &mut Application) -> HookResult {
        (self.install)(app)
    }

    fn destroy(&self) -> HookResult {
        self.destroy.as_ref().map_or(Ok(()), |f| f())
    }

    fn before_render(&self) -> HookResult {
        self.before_render.as_ref().map_or(Ok(()), |f| f())
    }

    fn render(&self, frame: &mut Frame<'_>) -> HookResult {
        self.render.as_ref().map_or(Ok(()), |f| f(frame))
    }

    fn after_render(&self) -> HookResult {
        self.after_render.as_ref().map_or(Ok(()), |f| f())
    }

    fn on_resize(&self, width: u16, height: u16) -> HookResult {
        self.on_resize.as_ref().map_or(Ok(()), |f| f(width, height))
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("after", &self.after)
            .field("before", &self.before)
            .finish_non_exhaustive()
    }
}
