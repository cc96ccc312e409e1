//! Trigger descriptions.

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::{HEAD, ObjectId};

fn default_true() -> bool {
    true
}

/// A condition sampled every frame and the actions it dispatches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Scene-unique name; also the namespace of the trigger's edge state.
    pub name: String,
    pub condition: Condition,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Dispatch on every frame the condition holds, not only on its edge.
    #[serde(default)]
    pub remain: bool,
    /// Whether the trigger evaluates from the first frame.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Hysteresis band applied to every threshold of the condition.
    pub epsilon: f64,
}

impl Trigger {
    pub fn new(name: impl Into<String>, condition: Condition, epsilon: f64) -> Self {
        Self {
            name: name.into(),
            condition,
            actions: Vec::new(),
            remain: false,
            enabled: true,
            epsilon,
        }
    }
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
    pub fn with_remain(mut self, remain: bool) -> Self {
        self.remain = remain;
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Whose position or orientation a condition samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[default]
    Head,
    Object(ObjectId),
}

impl Subject {
    pub fn object_id(&self) -> &str {
        match self {
            Subject::Head => HEAD,
            Subject::Object(id) => id,
        }
    }
}

/// A fixed point or an object's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Point([f64; 3]),
    Object(ObjectId),
}

/// What the head is expected to look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookTarget {
    Point([f64; 3]),
    Direction([f64; 3]),
    Object(ObjectId),
}

/// Which crossing of a volume boundary fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeEdge {
    #[default]
    Enter,
    Exit,
}

/// Condition kinds. Angles are in degrees, distances in scene units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Subject's forward vector within `angle` of `direction`.
    Orientation {
        #[serde(default)]
        subject: Subject,
        direction: [f64; 3],
        angle: f64,
    },
    /// Subject closer than `distance` to the anchor.
    Proximity {
        #[serde(default)]
        subject: Subject,
        anchor: Anchor,
        distance: f64,
    },
    /// Head looking at a target within `angle`.
    LookAt { target: LookTarget, angle: f64 },
    /// Subject moved more than `distance` since the previous frame.
    Movement {
        #[serde(default)]
        subject: Subject,
        distance: f64,
    },
    /// Subject crossing the boundary of an axis-aligned box.
    Volume {
        #[serde(default)]
        subject: Subject,
        min: [f64; 3],
        max: [f64; 3],
        #[serde(default)]
        edge: VolumeEdge,
    },
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Orientation { .. } => "orientation",
            Condition::Proximity { .. } => "proximity",
            Condition::LookAt { .. } => "look_at",
            Condition::Movement { .. } => "movement",
            Condition::Volume { .. } => "volume",
        }
    }
}
