//! Entity bookkeeping for sub-chunks and columns.

use rustc_hash::FxHashMap;

/// Ticks between saves of a column whose only change is the entities it holds.
pub const ENTITY_SAVE_INTERVAL: u64 = 600;

/// Handle of an entity owned by the external entity system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Entities tracked by a sub-chunk or by a column, with their last known height.
#[derive(Debug, Clone, Default)]
pub struct EntityContainer {
    entities: FxHashMap<EntityId, f64>,
    last_save_tick: u64,
}

impl EntityContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or moves an entity to the given height.
    pub fn add(&mut self, id: EntityId, y: f64) {
        self.entities.insert(id, y);
    }

    /// Removes an entity, returning true if it was present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    /// Returns true if the entity is tracked here.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over tracked entities and their heights.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, f64)> + '_ {
        self.entities.iter().map(|(&id, &y)| (id, y))
    }

    /// Appends the ids of entities whose height lies in `[min_y, max_y]`.
    pub fn collect_in_range(&self, min_y: f64, max_y: f64, out: &mut Vec<EntityId>) {
        out.extend(
            self.entities
                .iter()
                .filter(|&(_, &y)| y >= min_y && y <= max_y)
                .map(|(&id, _)| id),
        );
    }

    /// True if entities are held and the last save is at least
    /// [`ENTITY_SAVE_INTERVAL`] ticks old.
    #[must_use]
    pub fn needs_saving(&self, now: u64) -> bool {
        !self.entities.is_empty() && now >= self.last_save_tick + ENTITY_SAVE_INTERVAL
    }

    /// Records a save at the given tick.
    pub fn mark_saved(&mut self, now: u64) {
        self.last_save_tick = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_interval() {
        let mut container = EntityContainer::new();
        assert!(!container.needs_saving(10_000));

        container.add(EntityId(1), 64.0);
        container.mark_saved(100);
        assert!(!container.needs_saving(699));
        assert!(container.needs_saving(700));
    }

    #[test]
    fn test_range_filter() {
        let mut container = EntityContainer::new();
        container.add(EntityId(1), 10.0);
        container.add(EntityId(2), 20.5);
        container.add(EntityId(3), 40.0);

        let mut out = Vec::new();
        container.collect_in_range(10.0, 21.0, &mut out);
        out.sort();
        assert_eq!(out, vec![EntityId(1), EntityId(2)]);
    }
}
