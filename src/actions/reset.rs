//! Reset to the first-frame snapshot.
//!
//! Each target captures `alpha`, `visible`, position and orientation under
//! `reset.<key>` during its first-frame setup. A reset interpolates every
//! captured channel back to its snapshot and snaps on exit.
//!
//! A reset dispatched before its target's setup ran (`__init` unset) captures
//! first, so it holds the current values instead of restoring zeros. An
//! all-zero orientation is captured as identity.

use super::{ActionContext, ActionGenerator};
use crate::emit::keys::{self, ALPHA, INIT, VISIBLE};
use crate::emit::{Block, Expr, Stmt};

#[derive(Debug, Clone)]
pub struct ResetAction;

impl ResetAction {
    /// Channels interpolated towards the snapshot.
    fn channels() -> impl Iterator<Item = &'static str> {
        std::iter::once(ALPHA)
            .chain(keys::POSITION)
            .chain(keys::ORIENTATION)
    }

    fn delta_field(channel: &str) -> String {
        format!("d.{channel}")
    }

    /// Snapshot every channel; a degenerate orientation becomes identity.
    fn capture() -> Block {
        let mut block: Block = Self::channels()
            .chain(std::iter::once(VISIBLE))
            .map(|k| Stmt::set(keys::captured(k), Expr::prop(k)))
            .collect();
        let degenerate = keys::ORIENTATION
            .iter()
            .map(|k| Expr::prop(keys::captured(k)).equals(Expr::num(0.0)))
            .reduce(Expr::and)
            .unwrap_or(Expr::num(0.0));
        let [w, ..] = keys::ORIENTATION;
        block.push(Stmt::when(
            degenerate,
            vec![Stmt::set(keys::captured(w), Expr::num(1.0))].into(),
        ));
        block
    }

    /// Capture now if the target's first-frame setup has not run yet.
    fn capture_if_uninitialized() -> Stmt {
        Stmt::when(Expr::prop(INIT).equals(Expr::num(0.0)), Self::capture())
    }

    fn snap() -> Block {
        Self::channels()
            .chain(std::iter::once(VISIBLE))
            .map(|k| Stmt::set(k, Expr::prop(keys::captured(k))))
            .collect()
    }
}

impl ActionGenerator for ResetAction {
    fn emit_setup(&self) -> Block {
        Self::capture()
    }

    fn emit_enter(&self, ctx: &ActionContext) -> Block {
        let mut block: Block = vec![Self::capture_if_uninitialized()].into();
        if ctx.is_instant() {
            block.extend(Self::snap());
            return block;
        }
        // Visible while fading back, whichever way the snapshot points.
        block.push(Stmt::set(
            VISIBLE,
            Expr::prop(VISIBLE)
                .is_set()
                .or(Expr::prop(keys::captured(VISIBLE)).is_set())
                .flag(),
        ));
        for k in Self::channels() {
            block.push(ctx.store(
                &Self::delta_field(k),
                ctx.per_tick(Expr::prop(keys::captured(k)), Expr::prop(k)),
            ));
        }
        block
    }

    fn emit_continue(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        Self::channels()
            .map(|k| Stmt::set(k, Expr::prop(k).add(ctx.stored(&Self::delta_field(k)))))
            .collect()
    }

    fn emit_exit(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        Self::snap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ActionKey;
    use crate::host::interpreter::{MemoryBags, run_block};

    fn run(ctx: &ActionContext, bags: &mut MemoryBags) {
        let set = ResetAction.fragments(ctx);
        run_block(bags, "box", &set.enter);
        for _ in 0..ctx.ticks() {
            run_block(bags, "box", &set.continue_);
        }
        run_block(bags, "box", &set.exit);
    }

    // ==================== SNAPSHOT TESTS ====================

    #[test]
    fn test_setup_captures_every_channel() {
        let setup = ResetAction.emit_setup();
        // nine channels plus the identity fallback
        assert_eq!(setup.stmts().len(), 10);
        assert!(
            setup
                .stmts()
                .contains(&Stmt::set("reset.position.y", Expr::prop("position.y")))
        );
        assert!(
            setup
                .stmts()
                .contains(&Stmt::set("reset.visible", Expr::prop("visible")))
        );
    }

    #[test]
    fn test_setup_turns_zero_orientation_into_identity() {
        let mut bags = MemoryBags::default();
        run_block(&mut bags, "box", &ResetAction.emit_setup());
        assert_eq!(bags.get("box", "reset.orientation.w"), 1.0);

        let mut bags = MemoryBags::default();
        bags.set("box", "orientation.y", -1.0);
        run_block(&mut bags, "box", &ResetAction.emit_setup());
        assert_eq!(bags.get("box", "reset.orientation.w"), 0.0);
        assert_eq!(bags.get("box", "reset.orientation.y"), -1.0);
    }

    // ==================== RESET TESTS ====================

    #[test]
    fn test_reset_before_setup_keeps_current_values() {
        for duration in [0.0, 0.5] {
            let mut bags = MemoryBags::default();
            bags.set("box", "position.x", 3.0);
            bags.set("box", "alpha", 0.5);
            bags.set("box", "visible", 1.0);
            run(&ActionContext::new(ActionKey::new(0), duration, 10.0), &mut bags);
            assert_eq!(bags.get("box", "position.x"), 3.0, "{duration}s");
            assert_eq!(bags.get("box", "alpha"), 0.5, "{duration}s");
            assert_eq!(bags.get("box", "visible"), 1.0, "{duration}s");
            assert_eq!(bags.get("box", "orientation.w"), 1.0, "{duration}s");
            assert_eq!(bags.get("box", "orientation.x"), 0.0, "{duration}s");
        }
    }

    #[test]
    fn test_reset_after_setup_restores_snapshot() {
        let mut bags = MemoryBags::default();
        bags.set("box", "position.x", 3.0);
        bags.set("box", "orientation.w", 1.0);
        run_block(&mut bags, "box", &ResetAction.emit_setup());
        bags.set("box", INIT, 1.0);
        bags.set("box", "position.x", 8.0);
        run(&ActionContext::new(ActionKey::new(0), 0.3, 10.0), &mut bags);
        assert_eq!(bags.get("box", "position.x"), 3.0);
        assert_eq!(bags.get("box", "reset.position.x"), 3.0);
    }

    #[test]
    fn test_instant_reset_snaps() {
        let ctx = ActionContext::new(ActionKey::new(4), 0.0, 30.0);
        let set = ResetAction.fragments(&ctx);
        assert!(
            set.enter
                .stmts()
                .contains(&Stmt::set("orientation.w", Expr::prop("reset.orientation.w")))
        );
        assert!(set.continue_.is_empty());
        assert!(set.exit.is_empty());
    }

    #[test]
    fn test_timed_reset_stores_deltas() {
        let ctx = ActionContext::new(ActionKey::new(4), 1.0, 30.0);
        let set = ResetAction.fragments(&ctx);
        assert!(set.enter.stmts().contains(&Stmt::set(
            "act.4.d.alpha",
            Expr::prop("reset.alpha")
                .sub(Expr::prop("alpha"))
                .div(Expr::num(30.0))
        )));
        assert_eq!(set.continue_.stmts().len(), 8);
        assert_eq!(set.exit.stmts().len(), 9);
    }
}
