use crate::event::EventType;
use crate::handler::HandlerBinding;
use crate::priority::Priority;

/// One bucket of bindings per priority, iterated from `Lowest` to `Monitor`.
#[derive(Debug, Default)]
pub struct PriorityLadder {
    levels: [Vec<HandlerBinding>; Priority::COUNT],
}

impl PriorityLadder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `binding` at `priority` unless it is already on the ladder at any priority.
    ///
    /// A stored exact binding matched by a non-exact one stays at its priority but becomes
    /// non-exact.
    pub fn insert(&mut self, binding: HandlerBinding, priority: Priority) -> bool {
        let existing = self.levels.iter_mut().flat_map(|level| level.iter_mut()).find(|b| **b == binding);
        if let Some(existing) = existing {
            if existing.is_exact() && !binding.is_exact() {
                existing.widen();
            }
            return false;
        }
        self.levels[priority.index()].push(binding);
        true
    }

    /// Removes `binding` from whichever priority holds it.
    pub fn remove(&mut self, binding: &HandlerBinding) -> bool {
        for level in self.levels.iter_mut() {
            if let Some(position) = level.iter().position(|b| b == binding) {
                level.remove(position);
                return true;
            }
        }
        false
    }

    pub fn priority_of(&self, binding: &HandlerBinding) -> Option<Priority> {
        Priority::ALL
            .iter()
            .find(|priority| self.levels[priority.index()].contains(binding))
            .copied()
    }

    pub fn level(&self, priority: Priority) -> &[HandlerBinding] {
        &self.levels[priority.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerBinding> {
        self.levels.iter().flat_map(|level| level.iter())
    }

    /// Drops bindings whose listener no longer exists and returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let mut pruned = 0;
        for level in self.levels.iter_mut() {
            let before = level.len();
            level.retain(HandlerBinding::is_alive);
            pruned += before - level.len();
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }
}

/// The handlers registered for exactly one event type.
#[derive(Debug)]
pub struct EventSection {
    event_type: EventType,
    ladder: PriorityLadder,
}

impl EventSection {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            ladder: PriorityLadder::new(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn ladder(&self) -> &PriorityLadder {
        &self.ladder
    }

    pub fn insert(&mut self, binding: HandlerBinding, priority: Priority) -> bool {
        self.ladder.insert(binding, priority)
    }

    pub fn remove(&mut self, binding: &HandlerBinding) -> bool {
        self.ladder.remove(binding)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerBinding> {
        self.ladder.iter()
    }

    pub fn prune(&mut self) -> usize {
        self.ladder.prune()
    }

    pub fn len(&self) -> usize {
        self.ladder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ladder.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::event::tests::DamageEvent;
    use crate::handler::produce_handlers;
    use crate::handler::tests::Recorder;

    fn damage_binding(recorder: &Arc<Recorder>) -> HandlerBinding {
        produce_handlers(recorder, EventType::of::<DamageEvent>(), true).remove(0)
    }

    #[test]
    fn test_insert_if_absent() {
        let recorder = Arc::new(Recorder::default());
        let mut section = EventSection::new(EventType::of::<DamageEvent>());

        assert!(section.insert(damage_binding(&recorder), Priority::Low));
        assert!(!section.insert(damage_binding(&recorder), Priority::Low));
        assert!(!section.insert(damage_binding(&recorder), Priority::Monitor));

        assert_eq!(section.len(), 1);
        assert_eq!(section.ladder().level(Priority::Low).len(), 1);
        assert!(section.ladder().level(Priority::Monitor).is_empty());
    }

    #[test]
    fn test_non_exact_insert_widens_exact_binding() {
        let recorder = Arc::new(Recorder::default());
        let mut section = EventSection::new(EventType::of::<DamageEvent>());

        assert!(section.insert(damage_binding(&recorder), Priority::High));
        let wide = produce_handlers(&recorder, EventType::base(), false)
            .into_iter()
            .find(|b| b.event_type() == EventType::of::<DamageEvent>())
            .unwrap();
        assert!(!section.insert(wide, Priority::Low));

        assert_eq!(section.len(), 1);
        assert_eq!(section.ladder().level(Priority::High).len(), 1);
        assert!(!section.ladder().level(Priority::High)[0].is_exact());

        // An exact registration never narrows a non-exact one.
        assert!(!section.insert(damage_binding(&recorder), Priority::High));
        assert!(!section.ladder().level(Priority::High)[0].is_exact());
    }

    #[test]
    fn test_remove_searches_every_level() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let mut section = EventSection::new(EventType::of::<DamageEvent>());

        section.insert(damage_binding(&first), Priority::Highest);
        section.insert(damage_binding(&second), Priority::Lowest);

        assert!(section.remove(&damage_binding(&first)));
        assert!(!section.remove(&damage_binding(&first)));
        assert_eq!(section.ladder().priority_of(&damage_binding(&second)), Some(Priority::Lowest));
        assert_eq!(section.len(), 1);
    }

    #[test]
    fn test_iteration_runs_lowest_to_monitor() {
        let recorders: Vec<_> = (0..3).map(|_| Arc::new(Recorder::default())).collect();
        let mut section = EventSection::new(EventType::of::<DamageEvent>());

        section.insert(damage_binding(&recorders[0]), Priority::Monitor);
        section.insert(damage_binding(&recorders[1]), Priority::Lowest);
        section.insert(damage_binding(&recorders[2]), Priority::Normal);

        let order: Vec<_> = section.iter().cloned().collect();
        assert_eq!(order, vec![
            damage_binding(&recorders[1]),
            damage_binding(&recorders[2]),
            damage_binding(&recorders[0]),
        ]);
    }

    #[test]
    fn test_prune_drops_dead_targets() {
        let alive = Arc::new(Recorder::default());
        let dead = Arc::new(Recorder::default());
        let mut section = EventSection::new(EventType::of::<DamageEvent>());

        section.insert(damage_binding(&alive), Priority::Normal);
        section.insert(damage_binding(&dead), Priority::High);
        drop(dead);

        assert_eq!(section.prune(), 1);
        assert_eq!(section.len(), 1);
        assert!(section.iter().all(HandlerBinding::is_alive));
    }
}
