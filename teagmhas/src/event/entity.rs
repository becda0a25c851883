use serde::{Deserialize, Serialize};

use crate::event::Event;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct EntityId(pub u64);

/// Sent when an entity, usually a player, dies. Informing event.
#[derive(Clone, Debug, Event)]
pub struct EntityDeathEvent {
    /// The controller that owned the now dead pawn.
    pub controller: Option<EntityId>,
    pub dead_pawn: EntityId,
}

impl EntityDeathEvent {
    pub fn new(controller: Option<EntityId>, dead_pawn: EntityId) -> Self {
        Self {
            controller,
            dead_pawn,
        }
    }
}
