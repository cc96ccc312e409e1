//! In-memory scene graph consumed by the compiler.
//!
//! The scene graph is supplied fully built by the document layer (or
//! deserialized from JSON with `serde`). The compiler only reads it.
//!
//! Submodules overview:
//! - [`action`] – behaviors with a duration and a target state
//! - [`trigger`] – conditions sampled every frame, bound to actions
//! - [`timeline`] – actions scheduled at start offsets
//! - [`group`] – named sets of objects used for fan-out
//! - [`index`] – name resolution and reference checks

pub mod action;
pub mod group;
pub mod index;
pub mod timeline;
pub mod trigger;

use serde::{Deserialize, Serialize};

pub use action::{Action, ActionKind, Placement, RelativeTo, Rotation, SoundChange, TimelineChange};
pub use group::Group;
pub use index::SceneIndex;
pub use timeline::{TimedAction, Timeline};
pub use trigger::{Anchor, Condition, LookTarget, Subject, Trigger, VolumeEdge};

/// Identifier of a scene object, unique across the whole scene.
pub type ObjectId = String;

/// Reserved id of the user's viewpoint. The host keeps its bag current.
pub const HEAD: &str = "head";

fn default_true() -> bool {
    true
}

fn identity_orientation() -> [f64; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

/// One object of the scene, with its attached logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Initial position.
    #[serde(default)]
    pub position: [f64; 3],
    /// Initial orientation as a `(w, x, y, z)` quaternion.
    #[serde(default = "identity_orientation")]
    pub orientation: [f64; 4],
    /// Initial visibility.
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub timelines: Vec<Timeline>,
    /// Link actions, dispatched when the user selects the object.
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub children: Vec<SceneObject>,
}

impl SceneObject {
    pub fn new(id: impl Into<ObjectId>) -> Self {
        Self {
            id: id.into(),
            position: [0.0; 3],
            orientation: identity_orientation(),
            visible: true,
            triggers: Vec::new(),
            timelines: Vec::new(),
            actions: Vec::new(),
            children: Vec::new(),
        }
    }
    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = position;
        self
    }
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }
    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timelines.push(timeline);
        self
    }
    pub fn with_link_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
    pub fn with_child(mut self, child: SceneObject) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the object owns logic that must run every frame.
    pub fn has_logic(&self) -> bool {
        !self.triggers.is_empty() || !self.timelines.is_empty() || !self.actions.is_empty()
    }
}

/// The whole scene graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_object(mut self, object: SceneObject) -> Self {
        self.objects.push(object);
        self
    }
    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// All objects in depth-first pre-order.
    pub fn walk(&self) -> Vec<&SceneObject> {
        fn visit<'a>(object: &'a SceneObject, out: &mut Vec<&'a SceneObject>) {
            out.push(object);
            for child in &object.children {
                visit(child, out);
            }
        }
        let mut out = Vec::new();
        for object in &self.objects {
            visit(object, &mut out);
        }
        out
    }

    /// Parse a scene from a JSON document.
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Failed to parse scene: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_is_depth_first_preorder() {
        let scene = Scene::new()
            .with_object(
                SceneObject::new("a")
                    .with_child(SceneObject::new("a1").with_child(SceneObject::new("a1x")))
                    .with_child(SceneObject::new("a2")),
            )
            .with_object(SceneObject::new("b"));
        let ids: Vec<&str> = scene.walk().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn test_object_defaults_from_json() {
        let scene = Scene::from_json(r#"{ "objects": [ { "id": "lamp" } ] }"#).unwrap();
        let lamp = &scene.objects[0];
        assert!(lamp.visible);
        assert_eq!(lamp.orientation, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(lamp.position, [0.0; 3]);
        assert!(!lamp.has_logic());
    }

    #[test]
    fn test_scene_from_json_with_logic() {
        let text = r#"{
            "objects": [{
                "id": "door",
                "visible": false,
                "triggers": [{
                    "name": "near",
                    "epsilon": 0.01,
                    "condition": {
                        "kind": "proximity",
                        "subject": "head",
                        "anchor": { "point": [0, 0, 0] },
                        "distance": 2.0
                    },
                    "actions": [ { "kind": "visibility", "visible": true, "duration": 1.0 } ]
                }]
            }]
        }"#;
        let scene = Scene::from_json(text).unwrap();
        let door = &scene.objects[0];
        assert!(!door.visible);
        assert!(door.has_logic());
        let trigger = &door.triggers[0];
        assert!(trigger.enabled);
        assert!(!trigger.remain);
        assert!(matches!(trigger.condition, Condition::Proximity { .. }));
        assert!(matches!(
            trigger.actions[0].kind,
            ActionKind::Visibility { visible: true }
        ));
    }

    #[test]
    fn test_bad_json_is_reported() {
        assert!(Scene::from_json("{ not json").is_err());
    }
}
