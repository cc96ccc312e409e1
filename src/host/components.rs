//! Components of the reference host world.

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

use crate::emit::FragmentSet;
use crate::scene::ObjectId;

/// Per-object durable key/value storage. Absent keys read as `0`.
#[derive(Debug, Clone, Default, Component)]
pub struct PropertyBag {
    values: FxHashMap<String, f64>,
}

impl PropertyBag {
    pub fn get(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
    pub fn get_values(&self) -> &FxHashMap<String, f64> {
        &self.values
    }
}

/// Scene identity of an entity.
#[derive(Debug, Clone, Component)]
pub struct HostedObject {
    pub id: ObjectId,
}

/// Marks the user's viewpoint. Its forward vector is set by the host, never
/// derived from its orientation.
#[derive(Debug, Clone, Copy, Default, Component)]
pub struct Head;

/// Compiled logic installed in the object's three phase slots.
#[derive(Debug, Clone, Component)]
pub struct ObjectLogic {
    pub fragments: FragmentSet,
}
