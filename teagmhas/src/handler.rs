//! Listener declaration and handler bindings.
//!
//! A [`Listener`] declares its handler methods once, each taking exactly one event by mutable
//! reference. [`produce_handlers`] turns those declarations into [`HandlerBinding`]s for one
//! listener instance, filtered against an event type.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::event::{Event, EventType};

type Callback = Arc<dyn Fn(&(dyn Any + Send + Sync), &mut dyn Event) + Send + Sync>;

/// An object that receives events.
///
/// ```
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use teagmhas::{Event, HandlerTable, Listener};
///
/// #[derive(Event)]
/// struct DamageEvent {
///     amount: i32,
/// }
///
/// struct Armor {
///     absorbed: AtomicI32,
/// }
///
/// impl Armor {
///     fn on_damage(&self, event: &mut DamageEvent) {
///         self.absorbed.fetch_add(1, Ordering::SeqCst);
///         event.amount -= 1;
///     }
/// }
///
/// impl Listener for Armor {
///     fn declare_handlers(handlers: &mut HandlerTable<Self>) {
///         handlers.on("on_damage", Self::on_damage);
///     }
/// }
/// ```
pub trait Listener: Send + Sync + Sized + 'static {
    fn declare_handlers(handlers: &mut HandlerTable<Self>);
}

/// Identifies one handler method of a listener type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HandlerId {
    pub name: &'static str,
    pub event_type: EventType,
}

/// The handler methods declared by a listener type.
pub struct HandlerTable<L> {
    handlers: Vec<(HandlerId, Callback)>,
    _listener: PhantomData<fn(&L)>,
}

impl<L: Listener> HandlerTable<L> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            _listener: PhantomData,
        }
    }

    /// Declares `method` as the handler called `name` for events of type `E`.
    ///
    /// Declaring the same name for the same event type twice keeps the first declaration.
    pub fn on<E: Event>(&mut self, name: &'static str, method: fn(&L, &mut E)) -> &mut Self {
        let id = HandlerId {
            name,
            event_type: EventType::of::<E>(),
        };

        if self.handlers.iter().any(|(existing, _)| *existing == id) {
            return self;
        }

        let callback: Callback = Arc::new(move |target: &(dyn Any + Send + Sync), event: &mut dyn Event| {
            let listener = target.downcast_ref::<L>();
            let event = event.as_any_mut().downcast_mut::<E>();
            if let (Some(listener), Some(event)) = (listener, event) {
                method(listener, event);
            }
        });

        self.handlers.push((id, callback));
        self
    }

    pub fn ids(&self) -> impl Iterator<Item = HandlerId> + '_ {
        self.handlers.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<L: Listener> Default for HandlerTable<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// One listener instance bound to one of its handler methods.
///
/// The listener is held weakly; once it is dropped the binding stops firing. Equality only
/// looks at the listener's identity and the method.
#[derive(Clone)]
pub struct HandlerBinding {
    target: Weak<dyn Any + Send + Sync>,
    target_address: usize,
    method: HandlerId,
    exact: bool,
    callback: Callback,
}

impl HandlerBinding {
    pub fn method(&self) -> HandlerId {
        self.method
    }

    /// The event type of the handler's parameter.
    pub fn event_type(&self) -> EventType {
        self.method.event_type
    }

    /// Exact bindings only fire for events dispatched as precisely their event type, not for
    /// subtypes.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Lets the binding fire for subtypes as well. Bindings never become exact again.
    pub(crate) fn widen(&mut self) {
        self.exact = false;
    }

    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Calls the handler. Returns false if the listener is gone.
    ///
    /// `event` must already be resolved to [`event_type`](Self::event_type).
    pub fn invoke(&self, event: &mut dyn Event) -> bool {
        match self.target.upgrade() {
            Some(target) => {
                (self.callback)(&*target, event);
                true
            },
            None => false,
        }
    }
}

impl PartialEq for HandlerBinding {
    fn eq(&self, other: &Self) -> bool {
        self.target_address == other.target_address && self.method == other.method
    }
}

impl Eq for HandlerBinding { }

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("target", &format_args!("{:#x}", self.target_address))
            .field("method", &self.method.name)
            .field("event_type", &self.method.event_type)
            .field("exact", &self.exact)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Anything a listener can be handed to the registry as.
///
/// A `None` or a dangling `Weak` is an absent listener.
pub trait ListenerRef {
    type Listener: Listener;

    fn listener(&self) -> Option<Arc<Self::Listener>>;
}

impl<L: Listener> ListenerRef for Arc<L> {
    type Listener = L;

    fn listener(&self) -> Option<Arc<L>> {
        Some(self.clone())
    }
}

impl<L: Listener> ListenerRef for Weak<L> {
    type Listener = L;

    fn listener(&self) -> Option<Arc<L>> {
        self.upgrade()
    }
}

impl<L: Listener> ListenerRef for Option<Arc<L>> {
    type Listener = L;

    fn listener(&self) -> Option<Arc<L>> {
        self.clone()
    }
}

/// Binds every handler of `listener` whose event type is a subtype of `root_type`, or exactly
/// `root_type` when `exact` is set. Bindings produced with `exact` are marked as such.
///
/// Duplicates are not filtered here.
pub fn produce_handlers<L: Listener>(listener: &Arc<L>, root_type: EventType, exact: bool) -> Vec<HandlerBinding> {
    let mut table = HandlerTable::new();
    L::declare_handlers(&mut table);

    let target_address = Arc::as_ptr(listener) as *const () as usize;
    let target: Weak<L> = Arc::downgrade(listener);
    let target: Weak<dyn Any + Send + Sync> = target;

    table.handlers
        .into_iter()
        .filter(|(id, _)| {
            if exact {
                id.event_type == root_type
            } else {
                id.event_type.is_subtype_of(root_type)
            }
        })
        .map(|(method, callback)| HandlerBinding {
            target: target.clone(),
            target_address,
            method,
            exact,
            callback,
        })
        .collect()
}
