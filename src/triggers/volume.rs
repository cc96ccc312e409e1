//! Volume trigger: the subject enters or leaves an axis-aligned box.
//!
//! The box is widened by a margin `m = eps * (2 * prev - 1)`: shrunk by `eps`
//! while the subject is outside and grown by `eps` while it is inside.

use super::{Edge, EdgeState, TriggerEvaluator};
use crate::emit::vector::position_of;
use crate::emit::{Block, Expr, Stmt};
use crate::error::{ConfigError, check_finite_vec};
use crate::scene::Subject;

const MARGIN: &str = "margin";

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeTrigger {
    subject: String,
    min: [f64; 3],
    max: [f64; 3],
    edge: Edge,
    epsilon: f64,
}

impl VolumeTrigger {
    pub fn new(
        context: &str,
        subject: &Subject,
        min: [f64; 3],
        max: [f64; 3],
        edge: Edge,
        epsilon: f64,
    ) -> Result<Self, ConfigError> {
        let min = check_finite_vec(context, "min", min)?;
        let max = check_finite_vec(context, "max", max)?;
        if let Some(axis) = (0..3).find(|&i| min[i] > max[i]) {
            return Err(ConfigError::InvalidParameter {
                context: context.to_string(),
                parameter: "max",
                value: max[axis],
            });
        }
        Ok(Self {
            subject: subject.object_id().to_string(),
            min,
            max,
            edge,
            epsilon,
        })
    }
}

impl TriggerEvaluator for VolumeTrigger {
    fn emit_prelude(&self, state: &EdgeState) -> Block {
        let margin = Expr::num(self.epsilon).mul(
            Expr::num(2.0)
                .mul(state.prev())
                .sub(Expr::num(1.0)),
        );
        vec![Stmt::local(MARGIN, margin)].into()
    }

    fn emit_test(&self, _state: &EdgeState) -> Expr {
        let margin = Expr::local(MARGIN);
        position_of(&self.subject)
            .into_iter()
            .zip(self.min.iter().zip(self.max))
            .flat_map(|(p, (&lo, hi))| {
                [
                    p.clone().ge(Expr::num(lo).sub(margin.clone())),
                    p.le(Expr::num(hi).add(margin.clone())),
                ]
            })
            .reduce(Expr::and)
            .unwrap_or_else(|| Expr::num(1.0).is_set())
    }

    fn edge(&self) -> Edge {
        self.edge
    }
}
