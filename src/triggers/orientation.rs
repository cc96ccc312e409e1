//! Orientation trigger: the subject faces within an angle of a fixed direction.

use glam::DVec3;

use super::{EdgeState, TriggerEvaluator, below};
use crate::emit::vector::{angle_deg, constant, forward_of};
use crate::emit::Expr;
use crate::error::{ConfigError, check_finite_vec, check_non_negative};
use crate::scene::Subject;

#[derive(Debug, Clone, PartialEq)]
pub struct OrientationTrigger {
    subject: String,
    direction: [f64; 3],
    angle: f64,
    epsilon: f64,
}

impl OrientationTrigger {
    pub fn new(
        context: &str,
        subject: &Subject,
        direction: [f64; 3],
        angle: f64,
        epsilon: f64,
    ) -> Result<Self, ConfigError> {
        let direction = DVec3::from_array(check_finite_vec(context, "direction", direction)?)
            .try_normalize()
            .ok_or_else(|| ConfigError::ZeroVector {
                context: context.to_string(),
                parameter: "direction",
            })?;
        Ok(Self {
            subject: subject.object_id().to_string(),
            direction: direction.to_array(),
            angle: check_non_negative(context, "angle", angle)?,
            epsilon,
        })
    }
}

impl TriggerEvaluator for OrientationTrigger {
    fn emit_test(&self, state: &EdgeState) -> Expr {
        let angle = angle_deg(forward_of(&self.subject), constant(self.direction));
        below(angle, self.angle, self.epsilon, state.prev())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{EdgeState, edge_block};
    use super::*;
    use crate::host::interpreter::MemoryBags;

    fn facing(bags: &mut MemoryBags, degrees: f64) {
        let r = degrees.to_radians();
        bags.set("head", "forward.x", r.sin());
        bags.set("head", "forward.y", r.cos());
        bags.set("head", "forward.z", 0.0);
    }

    #[test]
    fn test_fires_when_turned_into_cone() {
        let t = OrientationTrigger::new("t", &Subject::Head, [0.0, 2.0, 0.0], 10.0, 1.0).unwrap();
        let block = edge_block(&t, &EdgeState::trigger("t"), false, None, counter());
        let mut bags = MemoryBags::default();
        let angles = [45.0, 10.5, 8.0, 10.5, 11.5, 8.5];
        let counts = frames(&block, &mut bags, angles.len(), |i, b| facing(b, angles[i]));
        // 10.5 is inside the band: not enough to enter, not enough to leave
        assert_eq!(counts, vec![0.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(matches!(
            OrientationTrigger::new("t", &Subject::Head, [0.0; 3], 10.0, 0.0),
            Err(ConfigError::ZeroVector { .. })
        ));
    }

    #[test]
    fn test_negative_angle_rejected() {
        assert!(OrientationTrigger::new("t", &Subject::Head, [0.0, 1.0, 0.0], -1.0, 0.0).is_err());
    }
}
