//! The event registry.
//!
//! ```text
//!  register_events(listener) ──► produce_handlers ──► write lock ──► EventSection::insert
//!
//!  dispatch(event, Leaf) ──► read lock
//!        │
//!        ├─► Section(Leaf):  Lowest ─► Low ─► Normal ─► High ─► Highest ─► Monitor
//!        ├─► Section(Mid):   Lowest ─► ...                                 ─► Monitor
//!        └─► Section(Base):  Lowest ─► ...                                 ─► Monitor
//! ```
//!
//! The set of event types is fixed when the registry is built. Every type gets its section and
//! its ancestor chain up front; types added to the program later stay invisible to it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{upcast_mut, Event, EventType};
use crate::guard::RegistryLock;
use crate::handler::{produce_handlers, HandlerBinding, ListenerRef};
use crate::priority::Priority;
use crate::section::EventSection;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RegistrationResult {
    Success,
    /// Never produced: registering a handler twice succeeds and leaves one binding.
    AlreadyRegistered,
    /// Never produced: a single registration without a match reports `NoHandlersFound`.
    FailedToFindHandler,
    NoHandlersFound,
    InvalidInput,
}

impl RegistrationResult {
    pub fn is_success(&self) -> bool {
        *self == RegistrationResult::Success
    }
}

impl fmt::Display for RegistrationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            RegistrationResult::Success => "Success",
            RegistrationResult::AlreadyRegistered => "Already registered",
            RegistrationResult::FailedToFindHandler => "Failed to find handler",
            RegistrationResult::NoHandlersFound => "No handlers found",
            RegistrationResult::InvalidInput => "Invalid input",
        })
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    event_types: Vec<EventType>,
}

impl RegistryBuilder {
    /// Adds `E` and all of its ancestors.
    pub fn event<E: Event>(self) -> Self {
        self.event_type(EventType::of::<E>())
    }

    pub fn event_type(mut self, event_type: EventType) -> Self {
        for ancestor in event_type.ancestors() {
            if !self.event_types.contains(&ancestor) {
                self.event_types.push(ancestor);
            }
        }
        self
    }

    pub fn build(self) -> EventRegistry {
        EventRegistry::new(self.event_types)
    }
}

/// Maps event types to the handlers registered for them.
///
/// Dispatching takes a read on the registry, registering and unregistering take a write; see
/// [`guard`](crate::guard) for how the two interact. Handlers run while the read is held, so a
/// handler may dispatch further events but must not register or unregister.
pub struct EventRegistry {
    sections: RegistryLock<HashMap<EventType, EventSection>>,
    ancestry: HashMap<EventType, Vec<EventType>>,
}

impl EventRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Creates an empty section for every type in `event_types` and for each of their ancestors.
    pub fn new<I>(event_types: I) -> Self
    where
        I: IntoIterator<Item = EventType>,
    {
        let mut sections = HashMap::new();
        let mut ancestry = HashMap::new();

        for event_type in event_types {
            for ancestor in event_type.ancestors() {
                sections.entry(ancestor).or_insert_with(|| EventSection::new(ancestor));
                ancestry.entry(ancestor).or_insert_with(|| ancestor.ancestors());
            }
        }

        log!(VERBOSE, "EventRegistry created with {} event types", sections.len());

        Self {
            sections: RegistryLock::new(sections),
            ancestry,
        }
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.ancestry.keys().copied().collect()
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.ancestry.contains_key(&event_type)
    }

    /// Number of bindings registered for exactly `event_type`.
    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.sections.read().get(&event_type).map(EventSection::len).unwrap_or(0)
    }

    /// Registers every handler of `listener`, all at `priority`.
    ///
    /// Handlers already registered are left where they are.
    pub fn register_events<R: ListenerRef>(&self, listener: &R, priority: Priority) -> RegistrationResult {
        let listener = match listener.listener() {
            Some(listener) => listener,
            None => return RegistrationResult::InvalidInput,
        };

        let bindings = self.known(produce_handlers(&listener, EventType::base(), false));
        if bindings.is_empty() {
            return RegistrationResult::NoHandlersFound;
        }
        self.add_handlers(bindings, priority)
    }

    /// Registers the handler of `listener` whose event type is exactly `event_type`.
    ///
    /// The handler fires for events dispatched as `event_type` only, not for its subtypes.
    pub fn register_single_event<R: ListenerRef>(
        &self,
        listener: &R,
        event_type: EventType,
        priority: Priority,
    ) -> RegistrationResult {
        let listener = match listener.listener() {
            Some(listener) => listener,
            None => return RegistrationResult::InvalidInput,
        };

        let bindings = self.known(produce_handlers(&listener, event_type, true));
        if bindings.is_empty() {
            return RegistrationResult::NoHandlersFound;
        }
        self.add_handlers(bindings, priority)
    }

    pub fn unregister_events<R: ListenerRef>(&self, listener: &R) {
        if let Some(listener) = listener.listener() {
            let bindings = produce_handlers(&listener, EventType::base(), false);
            if !bindings.is_empty() {
                self.remove_handlers(bindings);
            }
        }
    }

    /// Unregisters the handlers of `listener` for `event_type` and for all of its subtypes.
    pub fn unregister_single_event<R: ListenerRef>(&self, listener: &R, event_type: EventType) {
        if let Some(listener) = listener.listener() {
            let bindings = produce_handlers(&listener, event_type, false);
            if !bindings.is_empty() {
                self.remove_handlers(bindings);
            }
        }
    }

    /// Runs every handler registered for `event_type` and its ancestors against `event`.
    ///
    /// The most derived type goes first; within a type handlers run from `Lowest` to
    /// `Monitor`. Does nothing for the root type and for types the registry was not built with.
    pub fn dispatch(&self, event: &mut dyn Event, event_type: EventType) {
        if event_type.is_base() || !event_type.is_subtype_of(EventType::base()) {
            return;
        }

        let chain = match self.ancestry.get(&event_type) {
            Some(chain) => chain,
            None => {
                log!(VERBOSE, "Ignoring dispatch of unknown event type {}", event_type);
                return;
            },
        };

        let sections = self.sections.read();

        for level_type in chain {
            let section = match sections.get(level_type) {
                Some(section) if !section.is_empty() => section,
                _ => continue,
            };

            if let Some(level_event) = upcast_mut(&mut *event, *level_type) {
                for binding in section.iter() {
                    if binding.is_exact() && *level_type != event_type {
                        continue;
                    }
                    binding.invoke(&mut *level_event);
                }
            }
        }
    }

    pub fn dispatch_event<E: Event>(&self, event: &mut E) {
        self.dispatch(event, EventType::of::<E>());
    }

    fn known(&self, bindings: Vec<HandlerBinding>) -> Vec<HandlerBinding> {
        bindings
            .into_iter()
            .filter(|binding| {
                let known = self.contains(binding.event_type());
                if !known {
                    log!(
                        ERROR,
                        "Handler {} takes {}, which the registry was not built with",
                        binding.method().name,
                        binding.event_type(),
                    );
                }
                known
            })
            .collect()
    }

    fn add_handlers(&self, bindings: Vec<HandlerBinding>, priority: Priority) -> RegistrationResult {
        let mut sections = self.sections.write();
        // A dropped listener's address may be reused by the one being registered.
        prune(&mut sections);

        for binding in bindings {
            let method = binding.method();
            if let Some(section) = sections.get_mut(&method.event_type) {
                if section.insert(binding, priority) {
                    log!(VERBOSE, "Registered {} for {} at {}", method.name, method.event_type, priority);
                }
            }
        }

        RegistrationResult::Success
    }

    fn remove_handlers(&self, bindings: Vec<HandlerBinding>) {
        let mut sections = self.sections.write();
        prune(&mut sections);

        for binding in bindings {
            if let Some(section) = sections.get_mut(&binding.event_type()) {
                if section.remove(&binding) {
                    log!(VERBOSE, "Unregistered {} for {}", binding.method().name, binding.event_type());
                }
            }
        }
    }
}

fn prune(sections: &mut HashMap<EventType, EventSection>) {
    let pruned: usize = sections.values_mut().map(EventSection::prune).sum();
    if pruned > 0 {
        log!(VERBOSE, "Pruned {} handlers of dropped listeners", pruned);
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("event_types", &self.ancestry.len())
            .finish()
    }
}
