//! Proximity trigger: the subject is closer than a distance to a point or to
//! another object.

use super::{EdgeState, TriggerEvaluator, below};
use crate::emit::vector::{Vec3Expr, constant, length, position_of, sub};
use crate::emit::{Block, Expr, Stmt};
use crate::error::{ConfigError, check_finite_vec, check_non_negative};
use crate::scene::{Anchor, SceneIndex, Subject};

const DISTANCE: &str = "dist";

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityTrigger {
    subject: String,
    anchor: Anchor,
    distance: f64,
    epsilon: f64,
}

impl ProximityTrigger {
    pub fn new(
        context: &str,
        index: &SceneIndex<'_>,
        subject: &Subject,
        anchor: &Anchor,
        distance: f64,
        epsilon: f64,
    ) -> Result<Self, ConfigError> {
        match anchor {
            Anchor::Point(p) => {
                check_finite_vec(context, "anchor", *p)?;
            }
            Anchor::Object(id) => index.require_object(context, id)?,
        }
        Ok(Self {
            subject: subject.object_id().to_string(),
            anchor: anchor.clone(),
            distance: check_non_negative(context, "distance", distance)?,
            epsilon,
        })
    }

    fn anchor_position(&self) -> Vec3Expr {
        match &self.anchor {
            Anchor::Point(p) => constant(*p),
            Anchor::Object(id) => position_of(id),
        }
    }
}

impl TriggerEvaluator for ProximityTrigger {
    fn emit_prelude(&self, _state: &EdgeState) -> Block {
        let offset = sub(position_of(&self.subject), self.anchor_position());
        vec![Stmt::local(DISTANCE, length(offset))].into()
    }

    fn emit_test(&self, state: &EdgeState) -> Expr {
        below(
            Expr::local(DISTANCE),
            self.distance,
            self.epsilon,
            state.prev(),
        )
    }
}
