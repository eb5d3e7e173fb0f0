use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::event::error::EventSystemError;
use crate::event::{Event, EventId, HandlerResult};
use crate::plugin_system::hooks::guard;

type Handler = Arc<dyn Fn(&dyn Event) -> HandlerResult + Send + Sync>;

//--------------------------------------------------
// EventDispatcher (Internal, wrapped by SharedEventDispatcher)
//--------------------------------------------------

/// Handler table keyed by event name and by concrete event type.
///
/// Each list keeps registration order, which is also invocation order.
pub struct EventDispatcher {
    handlers: HashMap<String, Vec<(EventId, Handler)>>,
    type_handlers: HashMap<TypeId, Vec<(EventId, Handler)>>,
    next_handler_id: EventId,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_handler_count: usize = self.handlers.values().map(|v| v.len()).sum();
        let type_handler_count: usize = self.type_handlers.values().map(|v| v.len()).sum();
        f.debug_struct("EventDispatcher")
            .field("name_handlers_count", &name_handler_count)
            .field("type_handlers_count", &type_handler_count)
            .field("next_handler_id", &self.next_handler_id)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            type_handlers: HashMap::new(),
            next_handler_id: 1,
        }
    }

    fn next_id(&mut self) -> EventId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        id
    }

    pub fn register_handler<F>(&mut self, event_name: impl Into<String>, handler: F) -> EventId
    where
        F: Fn(&dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.handlers
            .entry(event_name.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn register_type_handler<E, F>(&mut self, handler: F) -> EventId
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.next_id();
        let typed: Handler = Arc::new(move |event: &dyn Event| {
            match event.as_any().downcast_ref::<E>() {
                Some(e) => handler(e),
                None => Ok(()),
            }
        });
        self.type_handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, typed));
        id
    }

    pub fn unregister_handler(&mut self, id: EventId) -> bool {
        let mut found = false;
        for handlers in self.handlers.values_mut().chain(self.type_handlers.values_mut()) {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            if handlers.len() < len_before {
                found = true;
            }
        }
        found
    }

    /// Snapshot of the handlers interested in `event`, name handlers first
    fn handlers_for(&self, event: &dyn Event) -> Vec<(EventId, Handler)> {
        let by_name = self.handlers.get(event.name()).into_iter().flatten();
        let by_type = self
            .type_handlers
            .get(&event.as_any().type_id())
            .into_iter()
            .flatten();
        by_name.chain(by_type).cloned().collect()
    }

    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers.get(event_name).map_or(0, Vec::len)
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a single dispatch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of handlers invoked
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failures: Vec<EventSystemError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

//--------------------------------------------------
// SharedEventDispatcher (Public API)
//--------------------------------------------------

/// Shared handle to an [`EventDispatcher`].
///
/// The lock is only held while the handler table is read or changed, never
/// while handlers run, so a handler may register or remove handlers
/// (including itself) during dispatch. Such changes apply to the next
/// dispatch.
#[derive(Clone, Default)]
pub struct SharedEventDispatcher {
    dispatcher: Arc<Mutex<EventDispatcher>>,
}

impl fmt::Debug for SharedEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEventDispatcher").finish_non_exhaustive()
    }
}

impl SharedEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EventDispatcher> {
        // Handlers never run under the lock, so poisoning leaves the table intact.
        self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler for events with the given name
    pub fn on<F>(&self, event_name: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.lock().register_handler(event_name, handler);
        self.subscription(id)
    }

    /// Register a handler for every event of concrete type `E`
    pub fn on_type<E, F>(&self, handler: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.lock().register_type_handler::<E, F>(handler);
        self.subscription(id)
    }

    /// Remove a handler by id. Returns whether it was registered.
    pub fn off(&self, id: EventId) -> bool {
        self.lock().unregister_handler(id)
    }

    /// Deliver `event` to every interested handler, isolating failures
    pub fn emit(&self, event: &dyn Event) -> DispatchReport {
        let handlers = self.lock().handlers_for(event);
        let mut report = DispatchReport::default();

        for (id, handler) in handlers {
            report.delivered += 1;
            if let Err(e) = guard(|| handler(event)) {
                let failure = EventSystemError::HandlerFailed {
                    event_name: event.name().to_string(),
                    handler_id: id,
                    reason: e.to_string(),
                };
                log::error!("{}", failure);
                report.failures.push(failure);
            }
        }
        report
    }

    pub fn handler_count(&self, event_name: &str) -> usize {
        self.lock().handler_count(event_name)
    }

    fn subscription(&self, id: EventId) -> Subscription {
        Subscription {
            id,
            dispatcher: Arc::downgrade(&self.dispatcher),
        }
    }
}

/// Handle returned by [`SharedEventDispatcher::on`]; call
/// [`Subscription::unsubscribe`] to remove the handler. Dropping the handle
/// keeps the handler registered.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: EventId,
    dispatcher: Weak<Mutex<EventDispatcher>>,
}

impl Subscription {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn unsubscribe(self) -> Result<(), EventSystemError> {
        let dispatcher = self.dispatcher.upgrade().ok_or_else(|| {
            EventSystemError::HandlerUnregistrationFailed {
                id: self.id,
                reason: "event dispatcher has been dropped".to_string(),
            }
        })?;
        let removed = dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister_handler(self.id);
        if removed {
            Ok(())
        } else {
            Err(EventSystemError::HandlerUnregistrationFailed {
                id: self.id,
                reason: "handler is not registered".to_string(),
            })
        }
    }
}
