//! In-process event dispatch for game code.
//!
//! Listeners declare handler methods, each taking one event by mutable reference. An
//! [`EventRegistry`] maps every event type to its handlers, bucketed by [`Priority`]. Dispatching
//! an event runs the handlers of its type and of every ancestor type, most derived first, and
//! within each type from `Lowest` to `Monitor`, so higher priorities get the last say.
//!
//! ```
//! use std::sync::Arc;
//! use teagmhas::{Event, EventRegistry, HandlerTable, Listener, Priority};
//!
//! #[derive(Event)]
//! struct DamageEvent {
//!     amount: i32,
//! }
//!
//! struct Armor;
//!
//! impl Armor {
//!     fn on_damage(&self, event: &mut DamageEvent) {
//!         event.amount -= 2;
//!     }
//! }
//!
//! impl Listener for Armor {
//!     fn declare_handlers(handlers: &mut HandlerTable<Self>) {
//!         handlers.on("on_damage", Self::on_damage);
//!     }
//! }
//!
//! let registry = EventRegistry::builder().event::<DamageEvent>().build();
//! let armor = Arc::new(Armor);
//! assert!(registry.register_events(&armor, Priority::Normal).is_success());
//!
//! let mut event = DamageEvent { amount: 5 };
//! registry.dispatch_event(&mut event);
//! assert_eq!(event.amount, 3);
//! ```

extern crate self as teagmhas;

#[macro_use]
pub mod log;

pub mod context;
pub mod event;
pub mod guard;
pub mod handler;
pub mod priority;
pub mod registry;
pub mod section;
pub mod util;

pub use self::context::Context;
pub use self::event::{Cancellable, Event, EventType};
pub use self::handler::{HandlerBinding, HandlerId, HandlerTable, Listener, ListenerRef};
pub use self::priority::Priority;
pub use self::registry::{EventRegistry, RegistrationResult, RegistryBuilder};
