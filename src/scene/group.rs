use serde::{Deserialize, Serialize};

use super::ObjectId;

/// A named set of objects, possibly including other groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectId>,
    /// Nested groups whose members are included.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            groups: Vec::new(),
        }
    }
    pub fn with_objects<I, S>(mut self, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ObjectId>,
    {
        self.objects.extend(objects.into_iter().map(Into::into));
        self
    }
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}
