//! Trigger enable/disable.

use super::{ActionContext, ActionGenerator};
use crate::emit::keys::trigger_field;
use crate::emit::{Block, Expr, Stmt};

/// `trig.<name>.state` once a toggle has run.
pub const STATE_ENABLED: f64 = 1.0;
pub const STATE_DISABLED: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct ToggleAction {
    trigger: String,
    enabled: bool,
}

impl ToggleAction {
    pub fn new(trigger: &str, enabled: bool) -> Self {
        Self {
            trigger: trigger.to_string(),
            enabled,
        }
    }
}

impl ActionGenerator for ToggleAction {
    fn emit_enter(&self, _ctx: &ActionContext) -> Block {
        let state = if self.enabled {
            STATE_ENABLED
        } else {
            STATE_DISABLED
        };
        vec![Stmt::set(
            trigger_field(&self.trigger, "state"),
            Expr::num(state),
        )]
        .into()
    }

    fn emit_continue(&self, _ctx: &ActionContext) -> Block {
        Block::new()
    }

    fn emit_exit(&self, _ctx: &ActionContext) -> Block {
        Block::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ActionKey;

    #[test]
    fn test_toggle_writes_state() {
        let ctx = ActionContext::new(ActionKey::new(0), 0.0, 60.0);
        let set = ToggleAction::new("near", false).fragments(&ctx);
        assert_eq!(
            set.enter.stmts(),
            &[Stmt::set("trig.near.state", Expr::num(STATE_DISABLED))]
        );
        assert!(set.continue_.is_empty());
        assert!(set.exit.is_empty());
    }
}
