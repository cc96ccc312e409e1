//! Movement trigger: the subject moved farther than a distance since the
//! previous evaluation.
//!
//! The last sampled position is kept on the owner (`trig.<name>.last.*`). The
//! first evaluation only primes it, so a subject that starts away from the
//! origin does not fire.

use super::{EdgeState, TriggerEvaluator, above};
use crate::emit::keys::AXES;
use crate::emit::vector::{length, position_of, sub};
use crate::emit::{Block, Expr, Stmt};
use crate::error::{ConfigError, check_non_negative};
use crate::scene::Subject;

const MOVED: &str = "moved";

#[derive(Debug, Clone, PartialEq)]
pub struct MovementTrigger {
    subject: String,
    distance: f64,
    epsilon: f64,
}

impl MovementTrigger {
    pub fn new(
        context: &str,
        subject: &Subject,
        distance: f64,
        epsilon: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            subject: subject.object_id().to_string(),
            distance: check_non_negative(context, "distance", distance)?,
            epsilon,
        })
    }

    fn last_keys(state: &EdgeState) -> [String; 3] {
        AXES.map(|axis| state.field(&format!("last.{axis}")))
    }
}

impl TriggerEvaluator for MovementTrigger {
    fn emit_prelude(&self, state: &EdgeState) -> Block {
        let last = Self::last_keys(state).map(Expr::prop);
        let moved = length(sub(position_of(&self.subject), last));
        vec![Stmt::local(MOVED, moved)].into()
    }

    fn emit_test(&self, state: &EdgeState) -> Expr {
        Expr::prop(state.field("primed")).is_set().and(above(
            Expr::local(MOVED),
            self.distance,
            self.epsilon,
            state.prev(),
        ))
    }

    fn emit_epilogue(&self, state: &EdgeState) -> Block {
        let mut block: Block = Self::last_keys(state)
            .into_iter()
            .zip(position_of(&self.subject))
            .map(|(key, value)| Stmt::set(key, value))
            .collect();
        block.push(Stmt::set(state.field("primed"), Expr::num(1.0)));
        block
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{EdgeState, edge_block};
    use super::*;
    use crate::host::interpreter::MemoryBags;

    fn run(xs: &[f64], remain: bool) -> Vec<f64> {
        let t = MovementTrigger::new("t", &Subject::Object("ball".into()), 0.5, 0.0).unwrap();
        let block = edge_block(&t, &EdgeState::trigger("t"), remain, None, counter());
        let mut bags = MemoryBags::default();
        frames(&block, &mut bags, xs.len(), |i, b| {
            set_position(b, "ball", [xs[i], 0.0, 0.0])
        })
    }

    #[test]
    fn test_first_evaluation_only_primes() {
        assert_eq!(run(&[10.0, 10.0], false), vec![0.0, 0.0]);
    }

    #[test]
    fn test_fires_on_large_step() {
        assert_eq!(run(&[0.0, 0.1, 1.0, 2.0, 2.1, 3.0], false), vec![0.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_remain_fires_while_moving() {
        assert_eq!(run(&[0.0, 1.0, 2.0, 2.0], true), vec![0.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_last_position_recorded() {
        let t = MovementTrigger::new("t", &Subject::Head, 1.0, 0.0).unwrap();
        let block = edge_block(&t, &EdgeState::trigger("t"), false, None, Block::new());
        let mut bags = MemoryBags::default();
        set_position(&mut bags, "head", [1.0, 2.0, 3.0]);
        crate::host::interpreter::run_block(&mut bags, "owner", &block);
        assert_eq!(bags.get("owner", "trig.t.last.y"), 2.0);
        assert_eq!(bags.get("owner", "trig.t.primed"), 1.0);
    }
}
