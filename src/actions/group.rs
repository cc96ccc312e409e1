//! Group fan-out.
//!
//! Wraps an object action and carries the flattened member list. Every member
//! receives the inner generator's blocks unchanged; the dispatcher binds each
//! member in turn, so a member only ever writes its own bag.

use super::{ActionContext, ActionGen, ActionGenerator};
use crate::emit::Block;
use crate::scene::index::Members;

#[derive(Debug, Clone)]
pub struct GroupAction {
    group: String,
    members: Members,
    inner: Box<ActionGen>,
}

impl GroupAction {
    pub fn new(group: &str, members: Members, inner: ActionGen) -> Self {
        Self {
            group: group.to_string(),
            members,
            inner: Box::new(inner),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn members(&self) -> &Members {
        &self.members
    }
}

impl ActionGenerator for GroupAction {
    fn emit_setup(&self) -> Block {
        self.inner.generator().emit_setup()
    }

    fn emit_enter(&self, ctx: &ActionContext) -> Block {
        self.inner.generator().emit_enter(ctx)
    }

    fn emit_continue(&self, ctx: &ActionContext) -> Block {
        self.inner.generator().emit_continue(ctx)
    }

    fn emit_exit(&self, ctx: &ActionContext) -> Block {
        self.inner.generator().emit_exit(ctx)
    }
}
