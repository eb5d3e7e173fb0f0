#![cfg(test)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{KernelConfig, Theme};
use crate::host::{HostSubscription, NotificationSender, TerminalHost};
use crate::kernel::bootstrap::Application;
use crate::kernel::render::Frame;
use crate::plugin_system::hooks::HookKind;
use crate::plugin_system::{HookResult, Plugin};
use crate::surface::{CellBuffer, Node, RenderTarget};

// ===== RECORDER =====

/// Shared, ordered log of "<who>:<what>" entries
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries ending in `:<suffix>`, with the suffix stripped
    pub fn with_suffix(&self, suffix: &str) -> Vec<String> {
        let tail = format!(":{}", suffix);
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_suffix(&tail).map(str::to_string))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

// ===== MOCK HOST =====

/// Terminal host whose size is set by the test. `None` makes the size
/// query fail.
#[derive(Clone)]
pub struct MockHost {
    pub size: Arc<Mutex<Option<(u16, u16)>>>,
    pub buffers_created: Arc<AtomicUsize>,
    pub active_subscriptions: Arc<AtomicUsize>,
}

impl MockHost {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: Arc::new(Mutex::new(Some((width, height)))),
            buffers_created: Arc::new(AtomicUsize::new(0)),
            active_subscriptions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        let host = Self::new(0, 0);
        *host.size.lock().unwrap() = None;
        host
    }

    pub fn set_size(&self, width: u16, height: u16) {
        *self.size.lock().unwrap() = Some((width, height));
    }

    pub fn buffers_created(&self) -> usize {
        self.buffers_created.load(Ordering::SeqCst)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active_subscriptions.load(Ordering::SeqCst)
    }

    fn subscription(&self) -> HostSubscription {
        self.active_subscriptions.fetch_add(1, Ordering::SeqCst);
        let active = Arc::clone(&self.active_subscriptions);
        HostSubscription::new(move || {
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

impl TerminalHost for MockHost {
    fn size(&self) -> io::Result<(u16, u16)> {
        self.size
            .lock()
            .unwrap()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "not a terminal"))
    }

    fn subscribe_resize(&mut self, _notify: NotificationSender) -> HostSubscription {
        self.subscription()
    }

    fn on_termination_signal(&mut self, _notify: NotificationSender) -> HostSubscription {
        self.subscription()
    }

    fn create_buffer(&self, width: u16, height: u16) -> Box<dyn RenderTarget> {
        self.buffers_created.fetch_add(1, Ordering::SeqCst);
        Box::new(CellBuffer::new(width, height))
    }
}

/// An 80x24 application on a mock host, plus the host handle
pub fn test_app() -> (Application, MockHost) {
    let host = MockHost::new(80, 24);
    let app = Application::new(host.clone(), KernelConfig::default());
    (app, host)
}

// ===== MOCK PLUGINS =====

/// A plugin that records every hook call as "<name>:<hook>" and can be
/// told to fail or panic in one hook
pub struct RecordingPlugin {
    name: String,
    dependencies: Vec<String>,
    after: Vec<String>,
    before: Vec<String>,
    log: Recorder,
    fail_in: Option<HookKind>,
    panic_in: Option<HookKind>,
}

impl RecordingPlugin {
    pub fn new(name: &str, log: &Recorder) -> Self {
        Self {
            name: name.to_string(),
            dependencies: Vec::new(),
            after: Vec::new(),
            before: Vec::new(),
            log: log.clone(),
            fail_in: None,
            panic_in: None,
        }
    }

    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }

    pub fn after(mut self, name: &str) -> Self {
        self.after.push(name.to_string());
        self
    }

    pub fn before(mut self, name: &str) -> Self {
        self.before.push(name.to_string());
        self
    }

    pub fn failing_in(mut self, hook: HookKind) -> Self {
        self.fail_in = Some(hook);
        self
    }

    pub fn panicking_in(mut self, hook: HookKind) -> Self {
        self.panic_in = Some(hook);
        self
    }

    pub fn shared(self) -> Arc<dyn Plugin> {
        Arc::new(self)
    }

    fn record(&self, hook: HookKind) -> HookResult {
        self.log.push(format!("{}:{}", self.name, hook));
        if self.panic_in == Some(hook) {
            panic!("{} panicked in {}", self.name, hook);
        }
        if self.fail_in == Some(hook) {
            return Err(format!("{} failed", hook).into());
        }
        Ok(())
    }
}

impl Plugin for RecordingPlugin {
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

    fn install(&self, _app: &mut Application) -> HookResult {
        self.record(HookKind::Install)
    }

    fn destroy(&self) -> HookResult {
        self.record(HookKind::Destroy)
    }

    fn before_render(&self) -> HookResult {
        self.record(HookKind::BeforeRender)
    }

    fn render(&self, _frame: &mut Frame<'_>) -> HookResult {
        self.record(HookKind::Render)
    }

    fn after_render(&self) -> HookResult {
        self.record(HookKind::AfterRender)
    }

    fn on_resize(&self, width: u16, height: u16) -> HookResult {
        self.log.push(format!("{}:resize {}x{}", self.name, width, height));
        self.record(HookKind::Resize)
    }
}

// ===== MOCK NODES =====

/// Root node that writes `text` on the first row and records lifecycle calls
pub struct TextNode {
    pub text: String,
    pub log: Recorder,
    pub fail_dispose: bool,
}

impl TextNode {
    pub fn new(text: &str, log: &Recorder) -> Self {
        Self {
            text: text.to_string(),
            log: log.clone(),
            fail_dispose: false,
        }
    }
}

impl Node for TextNode {
    fn render(&self, target: &mut dyn RenderTarget, _theme: &Theme) -> HookResult {
        self.log.push(format!("{}:paint", self.text));
        let buffer = target
            .as_any_mut()
            .downcast_mut::<CellBuffer>()
            .ok_or("render target is not a CellBuffer")?;
        buffer.put_str(0, 0, &self.text);
        Ok(())
    }

    fn dispose(&self) -> HookResult {
        self.log.push(format!("{}:dispose", self.text));
        if self.fail_dispose {
            return Err("dispose failed".into());
        }
        Ok(())
    }
}
