use serde::{Deserialize, Serialize};

use super::action::Action;

/// Actions dispatched at offsets measured from the timeline's start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Scene-unique name.
    pub name: String,
    /// Start running on the owner's first frame.
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub actions: Vec<TimedAction>,
}

/// An action and the second at which the timeline dispatches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedAction {
    pub start: f64,
    #[serde(flatten)]
    pub action: Action,
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            autostart: false,
            actions: Vec::new(),
        }
    }
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }
    pub fn at(mut self, start: f64, action: Action) -> Self {
        self.actions.push(TimedAction { start, action });
        self
    }
}
