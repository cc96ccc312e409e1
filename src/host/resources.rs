//! Resources of the reference host world.

use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

use crate::emit::HostCall;
use crate::scene::ObjectId;

/// Frame counter and the fixed tick rate of the session.
#[derive(Resource, Debug, Clone, Copy)]
pub struct HostClock {
    pub tick_rate: f64,
    /// Frames run so far; the frame being run during a schedule pass.
    pub frame: u64,
}

impl HostClock {
    pub fn new(tick_rate: f64) -> Self {
        Self {
            tick_rate,
            frame: 0,
        }
    }

    /// Seconds of scene time at the current frame.
    pub fn elapsed(&self) -> f64 {
        self.frame as f64 / self.tick_rate
    }
}

/// Object id to entity, plus the order phases run objects in.
#[derive(Resource, Debug, Default)]
pub struct ObjectIndex {
    entities: FxHashMap<ObjectId, Entity>,
    order: Vec<(ObjectId, Entity)>,
}

impl ObjectIndex {
    pub fn insert(&mut self, id: impl Into<ObjectId>, entity: Entity) {
        self.entities.insert(id.into(), entity);
    }
    pub fn get(&self, id: &str) -> Option<Entity> {
        self.entities.get(id).copied()
    }
    /// Append an object with logic to the run order.
    pub fn schedule(&mut self, id: impl Into<ObjectId>, entity: Entity) {
        self.order.push((id.into(), entity));
    }
    pub fn order(&self) -> &[(ObjectId, Entity)] {
        &self.order
    }
    pub fn len(&self) -> usize {
        self.entities.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// A host call made by emitted logic.
#[derive(Debug, Clone, PartialEq)]
pub struct HostCommand {
    pub frame: u64,
    pub object: ObjectId,
    pub call: HostCall,
}

/// Host calls in the order they were made.
#[derive(Resource, Debug, Default)]
pub struct HostCommandLog {
    pub commands: Vec<HostCommand>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let mut clock = HostClock::new(50.0);
        clock.frame = 25;
        assert!((clock.elapsed() - 0.5).abs() < 1e-12);
    }
}
