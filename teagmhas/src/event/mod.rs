use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::util::AsAny;

pub use teagmhas_derive::Event;

/// A payload that can be dispatched through an [`EventRegistry`](crate::EventRegistry).
///
/// Event types form a tree rooted at [`EventType::base`]. A subtype embeds the payload of its
/// parent and exposes it through [`parent_event_mut`](Event::parent_event_mut), so a listener
/// for the parent receives the embedded part when a subtype is dispatched.
///
/// Usually implemented with `#[derive(Event)]`:
///
/// ```
/// use teagmhas::Event;
///
/// #[derive(Event)]
/// struct DamageEvent {
///     amount: i32,
/// }
///
/// #[derive(Event)]
/// struct FallDamageEvent {
///     #[parent]
///     damage: DamageEvent,
///     height: f32,
/// }
/// ```
pub trait Event: AsAny + Send + 'static {
    /// The concrete type of this instance.
    fn event_type(&self) -> EventType;

    /// The static parent of this type, [`EventType::base`] for direct children of the root.
    fn parent_type() -> EventType where Self: Sized;

    /// The embedded parent payload, `None` when the parent is the root.
    fn parent_event_mut(&mut self) -> Option<&mut dyn Event>;
}

/// Informing events report something that already happened; cancellable events are dispatched
/// before an action is taken and carry a cancelled flag the caller checks afterwards.
///
/// The registry never looks at the flag.
pub trait Cancellable: Event {
    fn is_cancelled(&self) -> bool;

    fn set_cancelled(&mut self, cancelled: bool);

    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}

/// Descriptor of an event type.
///
/// Two descriptors are equal iff they describe the same Rust type.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
    parent: Option<fn() -> EventType>,
}

impl EventType {
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
            parent: Some(E::parent_type),
        }
    }

    /// The root of the event type tree. It is never dispatched.
    pub fn base() -> Self {
        Self {
            id: TypeId::of::<dyn Event>(),
            name: "EventBase",
            parent: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<EventType> {
        self.parent.map(|parent| parent())
    }

    pub fn is_base(&self) -> bool {
        *self == Self::base()
    }

    /// True if `other` is this type or one of its ancestors.
    pub fn is_subtype_of(&self, other: EventType) -> bool {
        let mut current = Some(*self);
        while let Some(event_type) = current {
            if event_type == other {
                return true;
            }
            current = event_type.parent();
        }
        false
    }

    /// This type followed by its ancestors, most derived first. The root is not included.
    pub fn ancestors(&self) -> Vec<EventType> {
        let mut chain = Vec::new();
        let mut current = Some(*self);
        while let Some(event_type) = current {
            if event_type.is_base() {
                break;
            }
            chain.push(event_type);
            current = event_type.parent();
        }
        chain
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType { }

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventType({})", self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Finds the part of `event` that is an instance of `target`, walking up through the embedded
/// parent payloads.
pub fn upcast_mut(event: &mut dyn Event, target: EventType) -> Option<&mut dyn Event> {
    if event.event_type() == target {
        Some(event)
    } else {
        event.parent_event_mut().and_then(|parent| upcast_mut(parent, target))
    }
}

pub mod entity;
