//! Name resolution over a scene graph.
//!
//! Built once per compilation. Checks that identifiers are unique and that
//! groups are acyclic, and answers the lookups generators need: does an object
//! exist, who owns a timeline or trigger, which objects a group expands to.

use std::collections::{BTreeMap, BTreeSet};

use smallvec::SmallVec;

use super::{HEAD, ObjectId, Scene, SceneObject};
use crate::error::ConfigError;

/// Group members after nested groups are flattened.
pub type Members = SmallVec<[ObjectId; 4]>;

pub struct SceneIndex<'a> {
    order: Vec<&'a SceneObject>,
    objects: BTreeMap<&'a str, &'a SceneObject>,
    trigger_owners: BTreeMap<&'a str, &'a str>,
    timeline_owners: BTreeMap<&'a str, &'a str>,
    groups: BTreeMap<&'a str, Members>,
}

impl<'a> SceneIndex<'a> {
    pub fn build(scene: &'a Scene) -> Result<Self, ConfigError> {
        let order = scene.walk();
        let mut objects = BTreeMap::new();
        let mut trigger_owners = BTreeMap::new();
        let mut timeline_owners = BTreeMap::new();

        for object in &order {
            if object.id == HEAD {
                return Err(ConfigError::ReservedObject(object.id.clone()));
            }
            if objects.insert(object.id.as_str(), *object).is_some() {
                return Err(ConfigError::DuplicateObject(object.id.clone()));
            }
            for trigger in &object.triggers {
                if trigger_owners
                    .insert(trigger.name.as_str(), object.id.as_str())
                    .is_some()
                {
                    return Err(ConfigError::DuplicateName {
                        kind: "trigger",
                        name: trigger.name.clone(),
                    });
                }
            }
            for timeline in &object.timelines {
                if timeline_owners
                    .insert(timeline.name.as_str(), object.id.as_str())
                    .is_some()
                {
                    return Err(ConfigError::DuplicateName {
                        kind: "timeline",
                        name: timeline.name.clone(),
                    });
                }
            }
        }

        let mut index = Self {
            order,
            objects,
            trigger_owners,
            timeline_owners,
            groups: BTreeMap::new(),
        };
        index.groups = index.flatten_groups(scene)?;
        Ok(index)
    }

    fn flatten_groups(&self, scene: &'a Scene) -> Result<BTreeMap<&'a str, Members>, ConfigError> {
        let mut declared = BTreeMap::new();
        for group in &scene.groups {
            if declared.insert(group.name.as_str(), group).is_some() {
                return Err(ConfigError::DuplicateName {
                    kind: "group",
                    name: group.name.clone(),
                });
            }
        }

        fn expand<'g>(
            name: &'g str,
            declared: &BTreeMap<&'g str, &'g super::Group>,
            index: &SceneIndex<'_>,
            visiting: &mut Vec<&'g str>,
            out: &mut Members,
        ) -> Result<(), ConfigError> {
            if visiting.contains(&name) {
                return Err(ConfigError::GroupCycle(name.to_string()));
            }
            let group: &'g super::Group =
                declared
                    .get(name)
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownGroup {
                        context: format!("group '{}'", visiting.last().copied().unwrap_or(name)),
                        group: name.to_string(),
                    })?;
            visiting.push(name);
            for member in &group.objects {
                if !index.objects.contains_key(member.as_str()) {
                    return Err(ConfigError::UnknownObject {
                        context: format!("group '{}'", name),
                        object: member.clone(),
                    });
                }
                if !out.contains(member) {
                    out.push(member.clone());
                }
            }
            for nested in &group.groups {
                expand(nested, declared, index, visiting, out)?;
            }
            visiting.pop();
            Ok(())
        }

        let mut groups = BTreeMap::new();
        for name in declared.keys().copied() {
            let mut members = Members::new();
            expand(name, &declared, self, &mut Vec::new(), &mut members)?;
            groups.insert(name, members);
        }
        Ok(groups)
    }

    /// Objects in depth-first pre-order.
    pub fn objects(&self) -> &[&'a SceneObject] {
        &self.order
    }

    /// Whether `id` names a scene object or the head.
    pub fn is_addressable(&self, id: &str) -> bool {
        id == HEAD || self.objects.contains_key(id)
    }

    pub fn require_object(&self, context: &str, id: &str) -> Result<(), ConfigError> {
        if self.is_addressable(id) {
            Ok(())
        } else {
            Err(ConfigError::UnknownObject {
                context: context.to_string(),
                object: id.to_string(),
            })
        }
    }

    pub fn group_members(&self, context: &str, group: &str) -> Result<&Members, ConfigError> {
        self.groups
            .get(group)
            .ok_or_else(|| ConfigError::UnknownGroup {
                context: context.to_string(),
                group: group.to_string(),
            })
    }

    pub fn timeline_owner(&self, context: &str, timeline: &str) -> Result<&'a str, ConfigError> {
        self.timeline_owners
            .get(timeline)
            .copied()
            .ok_or_else(|| ConfigError::UnknownTimeline {
                context: context.to_string(),
                timeline: timeline.to_string(),
            })
    }

    pub fn trigger_owner(&self, context: &str, trigger: &str) -> Result<&'a str, ConfigError> {
        self.trigger_owners
            .get(trigger)
            .copied()
            .ok_or_else(|| ConfigError::UnknownTrigger {
                context: context.to_string(),
                trigger: trigger.to_string(),
            })
    }

    /// Ids of every scene object, for membership checks.
    pub fn ids(&self) -> BTreeSet<&'a str> {
        self.objects.keys().copied().collect()
    }
}
