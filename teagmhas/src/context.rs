use std::sync::{Arc, RwLock};

use crate::event::{Event, EventType};
use crate::registry::EventRegistry;

/// Hands the registry to the subsystems that register for or dispatch events.
#[derive(Debug)]
pub struct Context {
    registry: RwLock<Option<Arc<EventRegistry>>>,
}

impl Context {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self {
            registry: RwLock::new(Some(registry)),
        }
    }

    pub fn empty() -> Self {
        Self {
            registry: RwLock::new(None),
        }
    }

    pub fn attach(&self, registry: Arc<EventRegistry>) {
        *self.registry.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(registry);
    }

    pub fn registry(&self) -> Option<Arc<EventRegistry>> {
        self.registry.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Dispatches through the attached registry. Returns false if there is none.
    pub fn dispatch_safely(&self, event: &mut dyn Event, event_type: EventType) -> bool {
        match self.registry() {
            Some(registry) => {
                registry.dispatch(event, event_type);
                true
            },
            None => false,
        }
    }

    /// Detaches the registry. Dispatches already running finish normally.
    pub fn shutdown(&self) {
        let registry = self.registry.write().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if registry.is_some() {
            log!(INFO, "Context shut down, event registry detached");
        }
    }
}
