//! Visibility fades.
//!
//! Drives the `alpha` channel linearly towards `1` (shown) or `0` (hidden).
//! The object is made visible on enter so a fade-in is seen, and `visible` is
//! snapped to the target on exit.

use super::{ActionContext, ActionGenerator};
use crate::emit::keys::{ALPHA, VISIBLE};
use crate::emit::{Block, Expr, Stmt};

const DELTA: &str = "delta";

#[derive(Debug, Clone)]
pub struct VisibilityAction {
    visible: bool,
}

impl VisibilityAction {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    fn target(&self) -> f64 {
        if self.visible { 1.0 } else { 0.0 }
    }

    fn snap(&self) -> Block {
        vec![
            Stmt::set(ALPHA, Expr::num(self.target())),
            Stmt::set(VISIBLE, Expr::num(self.target())),
        ]
        .into()
    }
}

impl ActionGenerator for VisibilityAction {
    fn emit_enter(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return self.snap();
        }
        vec![
            Stmt::set(VISIBLE, Expr::num(1.0)),
            ctx.store(
                DELTA,
                ctx.per_tick(Expr::num(self.target()), Expr::prop(ALPHA)),
            ),
        ]
        .into()
    }

    fn emit_continue(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        vec![Stmt::set(
            ALPHA,
            Expr::prop(ALPHA).add(ctx.stored(DELTA)),
        )]
        .into()
    }

    fn emit_exit(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        self.snap()
    }
}
