//! Frame systems of the reference host.
//!
//! One frame runs, in order:
//! - [`advance_clock_system`] – counts the frame
//! - [`sync_forward_system`] – derives `forward.*` from `orientation.*`
//! - [`enter_phase_system`], [`continue_phase_system`], [`exit_phase_system`] –
//!   run one phase of every object with logic, in compiled order
//! - [`clear_clicks_system`] – a click lasts a single frame
//!
//! Phases are phase-major: every object's enter runs before any continue.

use bevy_ecs::prelude::*;
use glam::{DQuat, DVec3};
use log::{debug, warn};

use super::components::{Head, ObjectLogic, PropertyBag};
use super::interpreter::{BagAccess, run_block};
use super::resources::{HostClock, HostCommand, HostCommandLog, ObjectIndex};
use crate::emit::keys::{CLICKED, FORWARD, ORIENTATION};
use crate::emit::{HostCall, Phase};

/// Bags of the world, addressed through the object index.
struct WorldBags<'a, 'w, 's, 'd> {
    index: &'a ObjectIndex,
    bags: &'a mut Query<'w, 's, &'d mut PropertyBag>,
    log: &'a mut HostCommandLog,
    frame: u64,
}

impl BagAccess for WorldBags<'_, '_, '_, '_> {
    fn read(&self, object: &str, key: &str) -> f64 {
        self.index
            .get(object)
            .and_then(|entity| self.bags.get(entity).ok())
            .map(|bag| bag.get(key))
            .unwrap_or(0.0)
    }

    fn write(&mut self, object: &str, key: &str, value: f64) {
        let Some(entity) = self.index.get(object) else {
            warn!("Write to unknown object '{}' ({})", object, key);
            return;
        };
        if let Ok(mut bag) = self.bags.get_mut(entity) {
            bag.set(key, value);
        }
    }

    fn host_call(&mut self, object: &str, call: &HostCall) {
        debug!("frame {}: {} {:?}", self.frame, object, call);
        self.log.commands.push(HostCommand {
            frame: self.frame,
            object: object.to_string(),
            call: call.clone(),
        });
    }
}

fn execute_phase(
    phase: Phase,
    index: &ObjectIndex,
    clock: &HostClock,
    logic: &Query<&ObjectLogic>,
    bags: &mut Query<&mut PropertyBag>,
    log: &mut HostCommandLog,
) {
    let mut access = WorldBags {
        index,
        bags,
        log,
        frame: clock.frame,
    };
    for (id, entity) in index.order() {
        let Ok(object_logic) = logic.get(*entity) else {
            continue;
        };
        let block = object_logic.fragments.phase(phase);
        if !block.is_empty() {
            run_block(&mut access, id, block);
        }
    }
}

pub fn advance_clock_system(mut clock: ResMut<HostClock>) {
    clock.frame += 1;
}

/// Forward vector of an orientation: the rotated +Y axis.
pub fn forward_of(orientation: [f64; 4]) -> [f64; 3] {
    let [w, x, y, z] = orientation;
    let q = DQuat::from_xyzw(x, y, z, w);
    if q.length_squared() == 0.0 {
        return DVec3::Y.to_array();
    }
    (q.normalize() * DVec3::Y).to_array()
}

pub fn sync_forward_system(mut query: Query<&mut PropertyBag, Without<Head>>) {
    for mut bag in query.iter_mut() {
        let forward = forward_of(ORIENTATION.map(|k| bag.get(k)));
        for (k, v) in FORWARD.iter().zip(forward) {
            bag.set(*k, v);
        }
    }
}

pub fn enter_phase_system(
    index: Res<ObjectIndex>,
    clock: Res<HostClock>,
    logic: Query<&ObjectLogic>,
    mut bags: Query<&mut PropertyBag>,
    mut log: ResMut<HostCommandLog>,
) {
    execute_phase(Phase::Enter, &index, &clock, &logic, &mut bags, &mut log);
}

pub fn continue_phase_system(
    index: Res<ObjectIndex>,
    clock: Res<HostClock>,
    logic: Query<&ObjectLogic>,
    mut bags: Query<&mut PropertyBag>,
    mut log: ResMut<HostCommandLog>,
) {
    execute_phase(Phase::Continue, &index, &clock, &logic, &mut bags, &mut log);
}

pub fn exit_phase_system(
    index: Res<ObjectIndex>,
    clock: Res<HostClock>,
    logic: Query<&ObjectLogic>,
    mut bags: Query<&mut PropertyBag>,
    mut log: ResMut<HostCommandLog>,
) {
    execute_phase(Phase::Exit, &index, &clock, &logic, &mut bags, &mut log);
}

pub fn clear_clicks_system(mut query: Query<&mut PropertyBag>) {
    for mut bag in query.iter_mut() {
        if bag.get(CLICKED) != 0.0 {
            bag.set(CLICKED, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_forward_of_identity_is_plus_y() {
        assert_eq!(forward_of([1.0, 0.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
        assert_eq!(forward_of([0.0; 4]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_forward_of_quarter_turn_about_z() {
        let half = std::f64::consts::FRAC_PI_4;
        let [x, y, _] = forward_of([half.cos(), 0.0, 0.0, half.sin()]);
        assert!(approx_eq(x, -1.0));
        assert!(approx_eq(y, 0.0));
    }

    #[test]
    fn test_sync_skips_head() {
        let mut world = World::new();
        let mut bag = PropertyBag::default();
        bag.set("orientation.w", 1.0);
        let object = world.spawn(bag.clone()).id();
        let mut head_bag = bag;
        head_bag.set("forward.z", -1.0);
        let head = world.spawn((head_bag, Head)).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(sync_forward_system);
        schedule.run(&mut world);

        let synced = world.get::<PropertyBag>(object).unwrap();
        assert_eq!(synced.get("forward.y"), 1.0);
        let head = world.get::<PropertyBag>(head).unwrap();
        assert_eq!(head.get("forward.z"), -1.0);
        assert_eq!(head.get("forward.y"), 0.0);
    }
}
