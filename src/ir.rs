use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where a person sits on the canvas.
///
/// `Pinned` comes from a position the user dragged the node to; layout uses
/// it verbatim instead of a computed coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Placement {
    #[default]
    Auto,
    Pinned {
        x: f32,
        y: f32,
    },
}

impl Placement {
    pub fn pinned(&self) -> Option<(f32, f32)> {
        match *self {
            Placement::Auto => None,
            Placement::Pinned { x, y } => Some((x, y)),
        }
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self, Placement::Pinned { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PersonRecord", into = "PersonRecord")]
pub struct Person {
    pub id: String,
    /// Display data owned by the record store (names, dates, places, ...).
    pub fields: Map<String, Value>,
    pub placement: Placement,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Wire shape of a person as the record store hands it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersonRecord {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f32>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl From<PersonRecord> for Person {
    fn from(record: PersonRecord) -> Self {
        let placement = match (record.x, record.y) {
            (Some(x), Some(y)) => Placement::Pinned { x, y },
            _ => Placement::Auto,
        };
        Self {
            id: record.id,
            fields: record.fields,
            placement,
            width: record.width,
            height: record.height,
        }
    }
}

impl From<Person> for PersonRecord {
    fn from(person: Person) -> Self {
        let pinned = person.placement.pinned();
        Self {
            id: person.id,
            x: pinned.map(|(x, _)| x),
            y: pinned.map(|(_, y)| y),
            width: person.width,
            height: person.height,
            fields: person.fields,
        }
    }
}

impl Person {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
            placement: Placement::Auto,
            width: None,
            height: None,
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn pinned_at(mut self, x: f32, y: f32) -> Self {
        self.placement = Placement::Pinned { x, y };
        self
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn display_name(&self) -> String {
        let first = self.field_str("firstName");
        let last = self.field_str("lastName");
        match (first, last) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self
                .field_str("name")
                .map(str::to_string)
                .unwrap_or_else(|| self.id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    ParentChild,
    Spouse,
}

/// A typed link between two people. For `ParentChild`, `from` is the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub from_person_id: String,
    pub to_person_id: String,
}

impl Relationship {
    pub fn parent_child(id: &str, parent: &str, child: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: RelationshipKind::ParentChild,
            from_person_id: parent.to_string(),
            to_person_id: child.to_string(),
        }
    }

    pub fn spouse(id: &str, a: &str, b: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: RelationshipKind::Spouse,
            from_person_id: a.to_string(),
            to_person_id: b.to_string(),
        }
    }

    pub fn touches(&self, person_id: &str) -> bool {
        self.from_person_id == person_id || self.to_person_id == person_id
    }

    /// The endpoint opposite `person_id`, if `person_id` is an endpoint.
    pub fn other(&self, person_id: &str) -> Option<&str> {
        if self.from_person_id == person_id {
            Some(&self.to_person_id)
        } else if self.to_person_id == person_id {
            Some(&self.from_person_id)
        } else {
            None
        }
    }
}

/// One tree's worth of records, as fetched from the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySnapshot {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub root_person_id: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
}

/// A user gesture reported back by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeChange {
    Moved {
        person_id: String,
        x: f32,
        y: f32,
    },
    Resized {
        person_ids: Vec<String>,
        width: f32,
        height: f32,
    },
}

impl FamilySnapshot {
    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    /// Applies a drag or resize to the in-memory records and returns how many
    /// people were updated. Unknown ids are skipped.
    pub fn apply_node_change(&mut self, change: &NodeChange) -> usize {
        match change {
            NodeChange::Moved { person_id, x, y } => {
                let mut updated = 0;
                for person in self.people.iter_mut().filter(|p| &p.id == person_id) {
                    person.placement = Placement::Pinned { x: *x, y: *y };
                    updated += 1;
                }
                updated
            }
            NodeChange::Resized {
                person_ids,
                width,
                height,
            } => {
                let mut updated = 0;
                for person in self
                    .people
                    .iter_mut()
                    .filter(|p| person_ids.contains(&p.id))
                {
                    person.width = Some(*width);
                    person.height = Some(*height);
                    updated += 1;
                }
                updated
            }
        }
    }
}
