//! Action descriptions.
//!
//! An [`Action`] is a bounded transition of one object (or a group, a
//! timeline, a trigger) towards a target state over `duration` seconds.

use serde::{Deserialize, Serialize};

use super::ObjectId;

/// A behavior to dispatch, with its duration and optional explicit target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Object the action applies to. Defaults to the object owning the
    /// trigger, timeline, or link that dispatches it.
    #[serde(default)]
    pub target: Option<ObjectId>,
    /// Seconds until the target state is reached. Zero means instantaneous.
    #[serde(default)]
    pub duration: f64,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(kind: ActionKind, duration: f64) -> Self {
        Self {
            target: None,
            duration,
            kind,
        }
    }
    pub fn visibility(visible: bool, duration: f64) -> Self {
        Self::new(ActionKind::Visibility { visible }, duration)
    }
    pub fn movement(placement: Placement, move_relative: bool, duration: f64) -> Self {
        Self::new(
            ActionKind::Move {
                placement,
                move_relative,
            },
            duration,
        )
    }
    pub fn sound(sound: impl Into<String>, change: SoundChange, duration: f64) -> Self {
        Self::new(
            ActionKind::Sound {
                sound: sound.into(),
                change,
            },
            duration,
        )
    }
    pub fn timeline(timeline: impl Into<String>, change: TimelineChange) -> Self {
        Self::new(
            ActionKind::Timeline {
                timeline: timeline.into(),
                change,
            },
            0.0,
        )
    }
    pub fn group(group: impl Into<String>, action: ActionKind, duration: f64) -> Self {
        Self::new(
            ActionKind::Group {
                group: group.into(),
                action: Box::new(action),
            },
            duration,
        )
    }
    pub fn reset(duration: f64) -> Self {
        Self::new(ActionKind::Reset, duration)
    }
    pub fn toggle_trigger(trigger: impl Into<String>, enabled: bool) -> Self {
        Self::new(
            ActionKind::TriggerToggle {
                trigger: trigger.into(),
                enabled,
            },
            0.0,
        )
    }
    pub fn with_target(mut self, target: impl Into<ObjectId>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// The behavior kinds the compiler knows how to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Fade the alpha channel towards shown or hidden.
    Visibility { visible: bool },
    /// Move and/or rotate the target.
    Move {
        placement: Placement,
        #[serde(default)]
        move_relative: bool,
    },
    /// Start or stop a sound, fading its volume.
    Sound { sound: String, change: SoundChange },
    /// Change the run state of a named timeline.
    Timeline {
        timeline: String,
        change: TimelineChange,
    },
    /// Apply an object action to every member of a group.
    Group {
        group: String,
        action: Box<ActionKind>,
    },
    /// Restore the target to the state captured on its first frame.
    Reset,
    /// Enable or disable a named trigger.
    TriggerToggle { trigger: String, enabled: bool },
}

impl ActionKind {
    /// Short label used in error contexts and comments.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Visibility { .. } => "visibility",
            ActionKind::Move { .. } => "move",
            ActionKind::Sound { .. } => "sound",
            ActionKind::Timeline { .. } => "timeline",
            ActionKind::Group { .. } => "group",
            ActionKind::Reset => "reset",
            ActionKind::TriggerToggle { .. } => "trigger_toggle",
        }
    }

    /// Kinds that act on a single object's own properties.
    pub fn is_object_action(&self) -> bool {
        matches!(
            self,
            ActionKind::Visibility { .. }
                | ActionKind::Move { .. }
                | ActionKind::Sound { .. }
                | ActionKind::Reset
        )
    }
}

/// Where a movement goes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Target position, or offset when the move is relative.
    #[serde(default)]
    pub position: Option<[f64; 3]>,
    #[serde(default)]
    pub relative_to: RelativeTo,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Placement {
    pub fn at(position: [f64; 3]) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
    pub fn relative_to(mut self, object: impl Into<ObjectId>) -> Self {
        self.relative_to = RelativeTo::Object(object.into());
        self
    }
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Frame an absolute position is expressed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeTo {
    #[default]
    Center,
    Object(ObjectId),
}

/// Orientation change of a movement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    None,
    /// Rotation of `angle` degrees around `axis`.
    Axis { axis: [f64; 3], angle: f64 },
    /// Face `point` with `up` as the up direction.
    LookAt { point: [f64; 3], up: [f64; 3] },
    /// Turn the object's local +X axis onto `normal`.
    Normal { normal: [f64; 3] },
}

/// What a sound action does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundChange {
    /// Start playback and fade to `volume` (0..=1).
    Start { volume: f64 },
    /// Fade out, then stop playback.
    Stop,
}

/// What a timeline action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineChange {
    /// Restart from the beginning.
    Start,
    /// Pause, keeping elapsed time and progress.
    Stop,
    /// Resume a paused timeline.
    Continue,
    /// Start only if the timeline has never been started.
    StartIfNotStarted,
}
