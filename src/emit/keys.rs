//! Property-bag key names.
//!
//! Host-maintained keys are constants; compiler-owned state keys are built by
//! the namespacing helpers below so every generator agrees on spelling.

pub const VISIBLE: &str = "visible";
pub const ALPHA: &str = "alpha";
pub const CLICKED: &str = "clicked";
/// First-frame setup has run on this object.
pub const INIT: &str = "__init";
/// Namespace of an object's link (click) edge state.
pub const LINK: &str = "link";
/// Edge state of an object's link (click) actions.
pub const LINK_PREV: &str = "link.prev";

pub const POSITION: [&str; 3] = ["position.x", "position.y", "position.z"];
pub const FORWARD: [&str; 3] = ["forward.x", "forward.y", "forward.z"];
pub const ORIENTATION: [&str; 4] = [
    "orientation.w",
    "orientation.x",
    "orientation.y",
    "orientation.z",
];

pub(crate) const AXES: [&str; 3] = ["x", "y", "z"];
pub(crate) const QUAT: [&str; 4] = ["w", "x", "y", "z"];

/// State namespace of one compiled action, shared by all of its targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionKey(String);

impl ActionKey {
    pub fn new(index: usize) -> Self {
        Self(format!("act.{index}"))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn field(&self, name: &str) -> String {
        format!("{}.{}", self.0, name)
    }
    /// Set while the action runs its continue phase.
    pub fn active(&self) -> String {
        self.field("active")
    }
    /// Ticks elapsed since dispatch.
    pub fn elapsed(&self) -> String {
        self.field("elapsed")
    }
}

/// Edge and enable state of a trigger.
///
/// `state` is `0` until a toggle action runs, then `1` (enabled) or `2`
/// (disabled). The declared initial state is baked into the evaluator.
pub fn trigger_field(trigger: &str, name: &str) -> String {
    format!("{}.{name}", trigger_prefix(trigger))
}

/// Namespace holding every [`trigger_field`] of one trigger.
pub fn trigger_prefix(trigger: &str) -> String {
    format!("trig.{trigger}")
}

/// Sequencer state of a timeline.
pub fn timeline_field(timeline: &str, name: &str) -> String {
    format!("tl.{timeline}.{name}")
}

/// Per-sound playback state.
pub fn sound_field(sound: &str, name: &str) -> String {
    format!("sound.{sound}.{name}")
}

/// Snapshot slot for a key, written on first frame and read by resets.
pub fn captured(key: &str) -> String {
    format!("reset.{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_key_fields() {
        let key = ActionKey::new(3);
        assert_eq!(key.as_str(), "act.3");
        assert_eq!(key.active(), "act.3.active");
        assert_eq!(key.elapsed(), "act.3.elapsed");
        assert_eq!(key.field("dx"), "act.3.dx");
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(trigger_field("near door", "prev"), "trig.near door.prev");
        assert_eq!(trigger_prefix("near door"), "trig.near door");
        assert_eq!(LINK_PREV, format!("{LINK}.prev"));
        assert_eq!(timeline_field("intro", "cursor"), "tl.intro.cursor");
        assert_eq!(sound_field("wind", "volume"), "sound.wind.volume");
        assert_eq!(captured(ALPHA), "reset.alpha");
    }
}
