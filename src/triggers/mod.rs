//! Trigger evaluators.
//!
//! An evaluator turns one condition kind into a per-frame boolean test; the
//! shared edge wrapper ([`edge_block`]) turns that level into dispatches:
//!
//! ```text
//! if <enabled> then
//!     <prelude>
//!     local cur = <test>
//!     if <edge fires> then <dispatch> end
//!     prev = cur and 1 or 0
//!     <epilogue>
//! end
//! ```
//!
//! `prev` is the one piece of durable state that threads frame N's evaluation
//! into frame N+1. It lives in the owner's bag next to the trigger's other
//! state, under `trig.<name>.*` (or `link.*` for click actions).
//!
//! Thresholds have hysteresis: a `value < T` condition becomes true below
//! `T - eps` and stays true below `T + eps`, so a value hovering at the
//! boundary does not fire repeatedly. `prev` selects the band.
//!
//! Submodules overview:
//! - [`orientation`] – subject forward vector within an angle of a direction
//! - [`proximity`] – subject within a distance of a point or object
//! - [`lookat`] – head looking at a point, direction or object
//! - [`movement`] – subject moved more than a distance since the last frame
//! - [`volume`] – subject entering or leaving a box
//! - [`click`] – object selected by the user

pub mod click;
pub mod lookat;
pub mod movement;
pub mod orientation;
pub mod proximity;
pub mod volume;

use crate::actions::toggle::{STATE_DISABLED, STATE_ENABLED};
use crate::emit::keys;
use crate::emit::{Block, Expr, Stmt};
use crate::error::{ConfigError, check_non_negative};
use crate::scene::{Condition, SceneIndex, Subject, Trigger, VolumeEdge};

pub use click::ClickTrigger;
pub use lookat::LookAtTrigger;
pub use movement::MovementTrigger;
pub use orientation::OrientationTrigger;
pub use proximity::ProximityTrigger;
pub use volume::VolumeTrigger;

/// Local holding the current level.
const CURRENT: &str = "cur";

/// Which transition of the level fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// false -> true
    Rising,
    /// true -> false
    Falling,
}

/// Namespace of one trigger's durable state in its owner's bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeState {
    prefix: String,
}

impl EdgeState {
    pub fn trigger(name: &str) -> Self {
        Self {
            prefix: keys::trigger_prefix(name),
        }
    }

    pub fn link() -> Self {
        Self {
            prefix: keys::LINK.to_string(),
        }
    }

    pub fn field(&self, name: &str) -> String {
        format!("{}.{}", self.prefix, name)
    }

    /// Previous level as `0`/`1`.
    pub fn prev(&self) -> Expr {
        Expr::prop(self.field("prev"))
    }
}

/// One condition kind.
pub trait TriggerEvaluator {
    /// Statements run before the test, e.g. binding locals.
    fn emit_prelude(&self, _state: &EdgeState) -> Block {
        Block::new()
    }
    /// The condition's level this frame, as a boolean.
    fn emit_test(&self, state: &EdgeState) -> Expr;
    /// Bookkeeping run after `prev` is updated.
    fn emit_epilogue(&self, _state: &EdgeState) -> Block {
        Block::new()
    }
    fn edge(&self) -> Edge {
        Edge::Rising
    }
}

/// `value < threshold` with hysteresis selected by `prev`.
pub fn below(value: Expr, threshold: f64, epsilon: f64, prev: Expr) -> Expr {
    value.lt(Expr::num(threshold - epsilon).add(Expr::num(2.0 * epsilon).mul(prev)))
}

/// `value > threshold` with hysteresis selected by `prev`.
pub fn above(value: Expr, threshold: f64, epsilon: f64, prev: Expr) -> Expr {
    value.gt(Expr::num(threshold + epsilon).sub(Expr::num(2.0 * epsilon).mul(prev)))
}

/// Wrap an evaluator's test in edge detection and dispatch.
pub fn edge_block(
    evaluator: &dyn TriggerEvaluator,
    state: &EdgeState,
    remain: bool,
    enabled: Option<Expr>,
    dispatch: Block,
) -> Block {
    let cur = Expr::local(CURRENT);
    let prev_set = state.prev().is_set();
    let fires = match (evaluator.edge(), remain) {
        (Edge::Rising, false) => cur.clone().and(prev_set.not()),
        (Edge::Rising, true) => cur.clone(),
        (Edge::Falling, false) => prev_set.and(cur.clone().not()),
        (Edge::Falling, true) => cur.clone().not(),
    };

    let mut body = evaluator.emit_prelude(state);
    body.push(Stmt::local(CURRENT, evaluator.emit_test(state)));
    if !dispatch.is_empty() {
        body.push(Stmt::when(fires, dispatch));
    }
    body.push(Stmt::set(state.field("prev"), cur.flag()));
    body.extend(evaluator.emit_epilogue(state));

    match enabled {
        Some(cond) => vec![Stmt::when(cond, body)].into(),
        None => body,
    }
}

/// Whether a trigger evaluates this frame, from its toggle state and its
/// declared initial state.
pub fn enabled_condition(state: &EdgeState, initially_enabled: bool) -> Expr {
    let toggled = Expr::prop(state.field("state"));
    if initially_enabled {
        toggled.differs(Expr::num(STATE_DISABLED))
    } else {
        toggled.equals(Expr::num(STATE_ENABLED))
    }
}

/// Dispatch table over the condition kinds of scene triggers.
#[derive(Debug, Clone)]
pub enum TriggerEval {
    Orientation(OrientationTrigger),
    Proximity(ProximityTrigger),
    LookAt(LookAtTrigger),
    Movement(MovementTrigger),
    Volume(VolumeTrigger),
}

impl TriggerEval {
    pub fn build(
        trigger: &Trigger,
        index: &SceneIndex<'_>,
        context: &str,
    ) -> Result<Self, ConfigError> {
        let epsilon = check_non_negative(context, "epsilon", trigger.epsilon)?;
        let require = |subject: &Subject| index.require_object(context, subject.object_id());

        Ok(match &trigger.condition {
            Condition::Orientation {
                subject,
                direction,
                angle,
            } => {
                require(subject)?;
                TriggerEval::Orientation(OrientationTrigger::new(
                    context, subject, *direction, *angle, epsilon,
                )?)
            }
            Condition::Proximity {
                subject,
                anchor,
                distance,
            } => {
                require(subject)?;
                TriggerEval::Proximity(ProximityTrigger::new(
                    context, index, subject, anchor, *distance, epsilon,
                )?)
            }
            Condition::LookAt { target, angle } => TriggerEval::LookAt(LookAtTrigger::new(
                context, index, target, *angle, epsilon,
            )?),
            Condition::Movement { subject, distance } => {
                require(subject)?;
                TriggerEval::Movement(MovementTrigger::new(context, subject, *distance, epsilon)?)
            }
            Condition::Volume {
                subject,
                min,
                max,
                edge,
            } => {
                require(subject)?;
                let edge = match edge {
                    VolumeEdge::Enter => Edge::Rising,
                    VolumeEdge::Exit => Edge::Falling,
                };
                TriggerEval::Volume(VolumeTrigger::new(
                    context, subject, *min, *max, edge, epsilon,
                )?)
            }
        })
    }

    pub fn evaluator(&self) -> &dyn TriggerEvaluator {
        match self {
            TriggerEval::Orientation(t) => t,
            TriggerEval::Proximity(t) => t,
            TriggerEval::LookAt(t) => t,
            TriggerEval::Movement(t) => t,
            TriggerEval::Volume(t) => t,
        }
    }
}

/// The full per-frame logic of a scene trigger.
pub fn trigger_block(trigger: &Trigger, eval: &TriggerEval, dispatch: Block) -> Block {
    let state = EdgeState::trigger(&trigger.name);
    let enabled = enabled_condition(&state, trigger.enabled);
    edge_block(
        eval.evaluator(),
        &state,
        trigger.remain,
        Some(enabled),
        dispatch,
    )
}

/// The per-frame logic of an object's click actions.
pub fn link_block(dispatch: Block) -> Block {
    let mut block: Block = vec![Stmt::comment("link actions")].into();
    block.extend(edge_block(
        &ClickTrigger,
        &EdgeState::link(),
        false,
        None,
        dispatch,
    ));
    block
}

#[cfg(test)]
pub(crate) mod testing {
    //! Frame-by-frame harness over the IR interpreter.

    use super::*;
    use crate::host::interpreter::{MemoryBags, run_block};

    pub const FIRED: &str = "fired";

    /// A dispatch block counting dispatches on the owner.
    pub fn counter() -> Block {
        vec![Stmt::set(FIRED, Expr::prop(FIRED).add(Expr::num(1.0)))].into()
    }

    /// Run `block` once per frame after `setup` prepares each frame's inputs;
    /// returns the dispatch count after each frame.
    pub fn frames<F>(block: &Block, bags: &mut MemoryBags, n: usize, mut setup: F) -> Vec<f64>
    where
        F: FnMut(usize, &mut MemoryBags),
    {
        (0..n)
            .map(|i| {
                setup(i, bags);
                run_block(bags, "owner", block);
                bags.get("owner", FIRED)
            })
            .collect()
    }

    pub fn set_position(bags: &mut MemoryBags, object: &str, p: [f64; 3]) {
        for (k, v) in keys::POSITION.iter().zip(p) {
            bags.set(object, k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::host::interpreter::MemoryBags;

    /// Level read straight from a bag key.
    struct Level;

    impl TriggerEvaluator for Level {
        fn emit_test(&self, _state: &EdgeState) -> Expr {
            Expr::prop("level").is_set()
        }
    }

    struct FallingLevel;

    impl TriggerEvaluator for FallingLevel {
        fn emit_test(&self, _state: &EdgeState) -> Expr {
            Expr::prop("level").is_set()
        }
        fn edge(&self) -> Edge {
            Edge::Falling
        }
    }

    fn run(evaluator: &dyn TriggerEvaluator, remain: bool, levels: &[f64]) -> Vec<f64> {
        let block = edge_block(evaluator, &EdgeState::trigger("t"), remain, None, counter());
        let mut bags = MemoryBags::default();
        frames(&block, &mut bags, levels.len(), |i, b| b.set("owner", "level", levels[i]))
    }

    // ==================== EDGE TESTS ====================

    #[test]
    fn test_rising_edge_fires_once_per_edge() {
        let counts = run(&Level, false, &[0.0, 1.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(counts, vec![0.0, 1.0, 1.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_remain_fires_every_true_frame() {
        let counts = run(&Level, true, &[1.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(counts, vec![1.0, 2.0, 3.0, 3.0, 4.0]);
    }

    #[test]
    fn test_falling_edge() {
        let counts = run(&FallingLevel, false, &[0.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(counts, vec![0.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_true_on_first_frame_fires() {
        let counts = run(&Level, false, &[1.0, 1.0]);
        assert_eq!(counts, vec![1.0, 1.0]);
    }

    // ==================== HYSTERESIS TESTS ====================

    #[test]
    fn test_below_band_depends_on_prev() {
        let mut bags = MemoryBags::default();
        bags.set("owner", "v", 2.005);
        let test = below(Expr::prop("v"), 2.0, 0.01, Expr::prop("p"));
        let block: Block = vec![Stmt::set("out", test.flag())].into();

        crate::host::interpreter::run_block(&mut bags, "owner", &block);
        assert_eq!(bags.get("owner", "out"), 0.0);
        bags.set("owner", "p", 1.0);
        crate::host::interpreter::run_block(&mut bags, "owner", &block);
        assert_eq!(bags.get("owner", "out"), 1.0);
    }

    // ==================== STATE KEY TESTS ====================

    #[test]
    fn test_edge_state_keys_match_shared_spelling() {
        let state = EdgeState::trigger("near door");
        for name in ["prev", "state", "primed"] {
            assert_eq!(state.field(name), keys::trigger_field("near door", name));
        }
        assert_eq!(EdgeState::link().field("prev"), keys::LINK_PREV);
    }

    // ==================== ENABLE TESTS ====================

    #[test]
    fn test_enabled_condition_follows_toggles() {
        let state = EdgeState::trigger("near");
        let block = |initial: bool| -> Block {
            vec![Stmt::set("on", enabled_condition(&state, initial).flag())].into()
        };
        let mut bags = MemoryBags::default();
        for (toggle, initial, expected) in [
            (0.0, true, 1.0),
            (0.0, false, 0.0),
            (STATE_ENABLED, false, 1.0),
            (STATE_DISABLED, true, 0.0),
        ] {
            bags.set("owner", "trig.near.state", toggle);
            crate::host::interpreter::run_block(&mut bags, "owner", &block(initial));
            assert_eq!(bags.get("owner", "on"), expected);
        }
    }

    #[test]
    fn test_disabled_trigger_does_not_update_prev() {
        let state = EdgeState::trigger("t");
        let block = edge_block(
            &Level,
            &state,
            false,
            Some(enabled_condition(&state, false)),
            counter(),
        );
        let mut bags = MemoryBags::default();
        let counts = frames(&block, &mut bags, 3, |i, b| {
            b.set("owner", "level", 1.0);
            if i == 2 {
                b.set("owner", "trig.t.state", STATE_ENABLED);
            }
        });
        assert_eq!(counts, vec![0.0, 0.0, 1.0]);
    }
}
