//! Reference host.
//!
//! A `bevy_ecs` world that plays the part of the rendering engine: one entity
//! per scene object plus the head, each with a [`PropertyBag`], and compiled
//! logic installed as [`ObjectLogic`] on the objects that have some. Each
//! call to [`SceneHost::run_frame`] runs one frame of the host contract
//! through the IR [`interpreter`].
//!
//! Submodules overview:
//! - [`components`] – property bags, identity, head marker, installed logic
//! - [`resources`] – clock, id index, host-call log
//! - [`systems`] – the chained frame systems
//! - [`interpreter`] – runs IR blocks against property bags

pub mod components;
pub mod interpreter;
pub mod resources;
pub mod systems;

use bevy_ecs::prelude::*;
use glam::DVec3;
use log::{info, warn};

use crate::driver::CompiledScene;
use crate::emit::keys::{ALPHA, CLICKED, FORWARD, ORIENTATION, POSITION, VISIBLE};
use crate::scene::{HEAD, Scene, SceneObject};
use components::{Head, HostedObject, ObjectLogic, PropertyBag};
use resources::{HostClock, HostCommand, HostCommandLog, ObjectIndex};
use systems::{
    advance_clock_system, clear_clicks_system, continue_phase_system, enter_phase_system,
    exit_phase_system, sync_forward_system,
};

/// Initial bag of a scene object.
pub fn seed_bag(object: &SceneObject) -> PropertyBag {
    let mut bag = PropertyBag::default();
    let visible = if object.visible { 1.0 } else { 0.0 };
    bag.set(VISIBLE, visible);
    bag.set(ALPHA, visible);
    for (k, v) in POSITION.iter().zip(object.position) {
        bag.set(*k, v);
    }
    for (k, v) in ORIENTATION.iter().zip(object.orientation) {
        bag.set(*k, v);
    }
    bag
}

/// Initial bag of the head: at the origin, looking along +Y.
pub fn seed_head() -> PropertyBag {
    let mut bag = PropertyBag::default();
    bag.set(VISIBLE, 1.0);
    bag.set(ALPHA, 1.0);
    bag.set(ORIENTATION[0], 1.0);
    bag.set(FORWARD[1], 1.0);
    bag
}

pub struct SceneHost {
    world: World,
    schedule: Schedule,
}

impl SceneHost {
    /// Spawn the scene and install its compiled logic.
    pub fn new(scene: &Scene, compiled: &CompiledScene) -> Self {
        let mut world = World::new();
        let mut index = ObjectIndex::default();

        for object in scene.walk() {
            let entity = world
                .spawn((
                    HostedObject {
                        id: object.id.clone(),
                    },
                    seed_bag(object),
                ))
                .id();
            index.insert(object.id.clone(), entity);
        }
        let head = world
            .spawn((HostedObject { id: HEAD.into() }, seed_head(), Head))
            .id();
        index.insert(HEAD, head);

        for object in &compiled.objects {
            let Some(entity) = index.get(&object.id) else {
                warn!("Compiled object '{}' is not in the scene", object.id);
                continue;
            };
            world.entity_mut(entity).insert(ObjectLogic {
                fragments: object.fragments.clone(),
            });
            index.schedule(object.id.clone(), entity);
        }

        info!(
            "Host ready: {} objects, {} with logic, {} Hz",
            index.len(),
            index.order().len(),
            compiled.tick_rate
        );
        world.insert_resource(index);
        world.insert_resource(HostClock::new(compiled.tick_rate));
        world.insert_resource(HostCommandLog::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                advance_clock_system,
                sync_forward_system,
                enter_phase_system,
                continue_phase_system,
                exit_phase_system,
                clear_clicks_system,
            )
                .chain(),
        );

        Self { world, schedule }
    }

    pub fn run_frame(&mut self) {
        self.schedule.run(&mut self.world);
    }

    pub fn run_frames(&mut self, frames: u64) {
        for _ in 0..frames {
            self.run_frame();
        }
    }

    /// Frames run so far.
    pub fn frame(&self) -> u64 {
        self.world.resource::<HostClock>().frame
    }

    fn entity(&self, id: &str) -> Option<Entity> {
        self.world.resource::<ObjectIndex>().get(id)
    }

    pub fn bag(&self, id: &str) -> Option<&PropertyBag> {
        self.entity(id)
            .and_then(|entity| self.world.get::<PropertyBag>(entity))
    }

    /// Read a property; unknown objects and keys read as `0`.
    pub fn get(&self, id: &str, key: &str) -> f64 {
        self.bag(id).map(|bag| bag.get(key)).unwrap_or(0.0)
    }

    /// Write a property. Returns `false` when the object does not exist.
    pub fn set(&mut self, id: &str, key: &str, value: f64) -> bool {
        let Some(entity) = self.entity(id) else {
            warn!("Write to unknown object '{}' ({})", id, key);
            return false;
        };
        match self.world.get_mut::<PropertyBag>(entity) {
            Some(mut bag) => {
                bag.set(key, value);
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, id: &str, position: [f64; 3]) -> bool {
        POSITION
            .iter()
            .zip(position)
            .all(|(k, v)| self.set(id, k, v))
    }

    /// Turn the head to face `direction`. Zero vectors are ignored.
    pub fn look(&mut self, direction: [f64; 3]) {
        let Some(forward) = DVec3::from_array(direction).try_normalize() else {
            warn!("Ignoring zero look direction");
            return;
        };
        for (k, v) in FORWARD.iter().zip(forward.to_array()) {
            self.set(HEAD, k, v);
        }
    }

    /// Select an object for the next frame.
    pub fn click(&mut self, id: &str) -> bool {
        self.set(id, CLICKED, 1.0)
    }

    /// Host calls made so far, in order.
    pub fn commands(&self) -> &[HostCommand] {
        &self.world.resource::<HostCommandLog>().commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::driver::compile;
    use crate::scene::{Action, Anchor, Condition, SoundChange, Subject, Trigger};

    fn host(scene: &Scene, rate: f64) -> SceneHost {
        let compiled = compile(scene, &CompilerConfig::new().with_tick_rate(rate)).unwrap();
        SceneHost::new(scene, &compiled)
    }

    #[test]
    fn test_bags_seeded_from_scene() {
        let scene = Scene::new().with_object(
            SceneObject::new("lamp")
                .with_position([1.0, 2.0, 3.0])
                .with_visible(false),
        );
        let host = host(&scene, 60.0);
        assert_eq!(host.get("lamp", "position.z"), 3.0);
        assert_eq!(host.get("lamp", VISIBLE), 0.0);
        assert_eq!(host.get("lamp", ALPHA), 0.0);
        assert_eq!(host.get("lamp", "orientation.w"), 1.0);
        assert_eq!(host.get(HEAD, "forward.y"), 1.0);
        assert_eq!(host.get("nobody", VISIBLE), 0.0);
    }

    #[test]
    fn test_click_dispatches_link_once() {
        let scene = Scene::new().with_object(
            SceneObject::new("button").with_link_action(Action::visibility(false, 0.0)),
        );
        let mut host = host(&scene, 60.0);
        host.run_frame();
        assert_eq!(host.get("button", VISIBLE), 1.0);
        assert!(host.click("button"));
        host.run_frame();
        assert_eq!(host.get("button", VISIBLE), 0.0);
        assert_eq!(host.get("button", CLICKED), 0.0);
        assert_eq!(host.frame(), 2);
    }

    #[test]
    fn test_sound_commands_logged_with_frame() {
        let trigger = Trigger::new(
            "near",
            Condition::Proximity {
                subject: Subject::Head,
                anchor: Anchor::Point([0.0, 0.0, 0.0]),
                distance: 1.0,
            },
            0.0,
        )
        .with_action(Action::sound("hum", SoundChange::Start { volume: 1.0 }, 0.0));
        let scene = Scene::new().with_object(SceneObject::new("radio").with_trigger(trigger));
        let mut host = host(&scene, 10.0);
        assert!(host.set_position(HEAD, [5.0, 0.0, 0.0]));
        host.run_frames(2);
        assert!(host.commands().is_empty());
        host.set_position(HEAD, [0.0, 0.0, 0.0]);
        host.run_frame();
        assert_eq!(host.commands().len(), 1);
        assert_eq!(host.commands()[0].frame, 3);
        assert_eq!(host.commands()[0].object, "radio");
        assert_eq!(host.get("radio", "sound.hum.volume"), 1.0);
    }

    #[test]
    fn test_look_normalizes() {
        let scene = Scene::new();
        let mut host = host(&scene, 60.0);
        host.look([0.0, 0.0, -3.0]);
        assert_eq!(host.get(HEAD, "forward.z"), -1.0);
        host.look([0.0; 3]);
        assert_eq!(host.get(HEAD, "forward.z"), -1.0);
        host.run_frame();
        assert_eq!(host.get(HEAD, "forward.z"), -1.0);
    }
}
