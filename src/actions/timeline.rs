//! Timeline run-state changes.
//!
//! Always instantaneous. Dispatched onto the timeline's owner, whose
//! sequencer reads the `tl.<name>.*` keys written here.

use super::{ActionContext, ActionGenerator};
use crate::emit::keys::timeline_field;
use crate::emit::{Block, Expr, Stmt};
use crate::scene::TimelineChange;

#[derive(Debug, Clone)]
pub struct TimelineAction {
    timeline: String,
    change: TimelineChange,
}

impl TimelineAction {
    pub fn new(timeline: &str, change: TimelineChange) -> Self {
        Self {
            timeline: timeline.to_string(),
            change,
        }
    }

    fn field(&self, name: &str) -> String {
        timeline_field(&self.timeline, name)
    }

    /// Restart from the beginning.
    fn start(&self) -> Block {
        vec![
            Stmt::set(self.field("running"), Expr::num(1.0)),
            Stmt::set(self.field("started"), Expr::num(1.0)),
            Stmt::set(self.field("elapsed"), Expr::num(0.0)),
            Stmt::set(self.field("cursor"), Expr::num(0.0)),
        ]
        .into()
    }

    /// The statements of this change, independent of any action state.
    pub fn apply(&self) -> Block {
        match self.change {
            TimelineChange::Start => self.start(),
            TimelineChange::Stop => vec![Stmt::set(self.field("running"), Expr::num(0.0))].into(),
            TimelineChange::Continue => vec![Stmt::set(
                self.field("running"),
                Expr::prop(self.field("started")),
            )]
            .into(),
            TimelineChange::StartIfNotStarted => vec![Stmt::when(
                Expr::prop(self.field("started")).equals(Expr::num(0.0)),
                self.start(),
            )]
            .into(),
        }
    }
}

impl ActionGenerator for TimelineAction {
    fn emit_enter(&self, _ctx: &ActionContext) -> Block {
        self.apply()
    }

    fn emit_continue(&self, _ctx: &ActionContext) -> Block {
        Block::new()
    }

    fn emit_exit(&self, _ctx: &ActionContext) -> Block {
        Block::new()
    }
}
