//! Click trigger behind an object's link actions.

use super::{EdgeState, TriggerEvaluator};
use crate::emit::Expr;
use crate::emit::keys::CLICKED;

/// Level of the owner's `clicked` key. The host clears it every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickTrigger;

impl TriggerEvaluator for ClickTrigger {
    fn emit_test(&self, _state: &EdgeState) -> Expr {
        Expr::prop(CLICKED).is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::super::link_block;
    use super::super::testing::*;
    use super::*;
    use crate::emit::keys::LINK_PREV;
    use crate::host::interpreter::MemoryBags;

    #[test]
    fn test_each_click_fires_once() {
        let block = link_block(counter());
        let mut bags = MemoryBags::default();
        let clicks = [0.0, 1.0, 1.0, 0.0, 1.0];
        let counts = frames(&block, &mut bags, clicks.len(), |i, b| {
            b.set("owner", CLICKED, clicks[i])
        });
        assert_eq!(counts, vec![0.0, 1.0, 1.0, 1.0, 2.0]);
        assert_eq!(bags.get("owner", LINK_PREV), 1.0);
    }
}
