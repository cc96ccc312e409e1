//! Look-at trigger: the head's forward vector points at a target.
//!
//! A point or object target is seen along the vector from the head's position
//! to it; a direction target is compared to the forward vector directly.

use glam::DVec3;

use super::{EdgeState, TriggerEvaluator, below};
use crate::emit::vector::{Vec3Expr, angle_deg, constant, forward_of, position_of, sub};
use crate::emit::Expr;
use crate::error::{ConfigError, check_finite_vec, check_non_negative};
use crate::scene::{HEAD, LookTarget, SceneIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct LookAtTrigger {
    target: LookTarget,
    angle: f64,
    epsilon: f64,
}

impl LookAtTrigger {
    pub fn new(
        context: &str,
        index: &SceneIndex<'_>,
        target: &LookTarget,
        angle: f64,
        epsilon: f64,
    ) -> Result<Self, ConfigError> {
        let target = match target {
            LookTarget::Point(p) => LookTarget::Point(check_finite_vec(context, "point", *p)?),
            LookTarget::Direction(d) => {
                let d = DVec3::from_array(check_finite_vec(context, "direction", *d)?)
                    .try_normalize()
                    .ok_or_else(|| ConfigError::ZeroVector {
                        context: context.to_string(),
                        parameter: "direction",
                    })?;
                LookTarget::Direction(d.to_array())
            }
            LookTarget::Object(id) => {
                if id == HEAD {
                    return Err(ConfigError::Unsupported {
                        context: context.to_string(),
                        reason: "the head cannot look at itself".to_string(),
                    });
                }
                index.require_object(context, id)?;
                LookTarget::Object(id.clone())
            }
        };
        Ok(Self {
            target,
            angle: check_non_negative(context, "angle", angle)?,
            epsilon,
        })
    }

    fn line_of_sight(&self) -> Vec3Expr {
        match &self.target {
            LookTarget::Point(p) => sub(constant(*p), position_of(HEAD)),
            LookTarget::Direction(d) => constant(*d),
            LookTarget::Object(id) => sub(position_of(id), position_of(HEAD)),
        }
    }
}

impl TriggerEvaluator for LookAtTrigger {
    fn emit_test(&self, state: &EdgeState) -> Expr {
        let angle = angle_deg(forward_of(HEAD), self.line_of_sight());
        below(angle, self.angle, self.epsilon, state.prev())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{EdgeState, edge_block};
    use super::*;
    use crate::host::interpreter::MemoryBags;
    use crate::scene::{Scene, SceneObject};

    fn look(bags: &mut MemoryBags, forward: [f64; 3]) {
        for (k, v) in crate::emit::keys::FORWARD.iter().zip(forward) {
            bags.set(HEAD, k, v);
        }
    }

    #[test]
    fn test_point_target_uses_head_position() {
        let scene = Scene::new();
        let index = SceneIndex::build(&scene).unwrap();
        let t = LookAtTrigger::new("t", &index, &LookTarget::Point([0.0, 10.0, 0.0]), 5.0, 0.0)
            .unwrap();
        let block = edge_block(&t, &EdgeState::trigger("t"), false, None, counter());
        let mut bags = MemoryBags::default();
        look(&mut bags, [0.0, 1.0, 0.0]);
        // the head stands beside the point, then walks under it
        let counts = frames(&block, &mut bags, 2, |i, b| {
            set_position(b, HEAD, [if i == 0 { 10.0 } else { 0.0 }, 0.0, 0.0])
        });
        assert_eq!(counts, vec![0.0, 1.0]);
    }

    #[test]
    fn test_object_target() {
        let scene = Scene::new().with_object(SceneObject::new("statue"));
        let index = SceneIndex::build(&scene).unwrap();
        let t = LookAtTrigger::new("t", &index, &LookTarget::Object("statue".into()), 10.0, 0.5)
            .unwrap();
        let block = edge_block(&t, &EdgeState::trigger("t"), false, None, counter());
        let mut bags = MemoryBags::default();
        set_position(&mut bags, "statue", [0.0, 0.0, -4.0]);
        let counts = frames(&block, &mut bags, 2, |i, b| {
            look(b, if i == 0 { [0.0, 1.0, 0.0] } else { [0.0, 0.0, -1.0] })
        });
        assert_eq!(counts, vec![0.0, 1.0]);
    }

    #[test]
    fn test_direction_target_and_validation() {
        let scene = Scene::new();
        let index = SceneIndex::build(&scene).unwrap();
        let t = LookAtTrigger::new("t", &index, &LookTarget::Direction([3.0, 0.0, 0.0]), 1.0, 0.0)
            .unwrap();
        let block = edge_block(&t, &EdgeState::trigger("t"), true, None, counter());
        let mut bags = MemoryBags::default();
        let counts = frames(&block, &mut bags, 2, |_, b| look(b, [1.0, 0.0, 0.0]));
        assert_eq!(counts, vec![1.0, 2.0]);

        assert!(LookAtTrigger::new("t", &index, &LookTarget::Direction([0.0; 3]), 1.0, 0.0).is_err());
        assert!(LookAtTrigger::new("t", &index, &LookTarget::Object(HEAD.into()), 1.0, 0.0).is_err());
        assert!(LookAtTrigger::new("t", &index, &LookTarget::Object("x".into()), 1.0, 0.0).is_err());
    }
}
