use std::collections::{HashMap, HashSet};

use crate::ir::{FamilySnapshot, Person, Relationship, RelationshipKind};

/// Lookup tables over one snapshot, built once per layout pass.
///
/// Every list holds positions into `relationships` in ascending order, so
/// iteration follows the order the record store returned them in.
/// Relationships with an endpoint that is not a known person never make it
/// into the tables.
#[derive(Debug)]
pub struct RelationshipIndex<'a> {
    snapshot: &'a FamilySnapshot,
    people: HashMap<&'a str, &'a Person>,
    spouses: HashMap<&'a str, Vec<usize>>,
    children: HashMap<&'a str, Vec<usize>>,
    parents: HashMap<&'a str, Vec<usize>>,
    connected: HashSet<&'a str>,
}

impl<'a> RelationshipIndex<'a> {
    pub fn new(snapshot: &'a FamilySnapshot) -> Self {
        let mut people = HashMap::with_capacity(snapshot.people.len());
        for person in &snapshot.people {
            if people.contains_key(person.id.as_str()) {
                log::debug!("duplicate person record `{}` ignored", person.id);
                continue;
            }
            people.insert(person.id.as_str(), person);
        }

        let mut index = Self {
            snapshot,
            people,
            spouses: HashMap::new(),
            children: HashMap::new(),
            parents: HashMap::new(),
            connected: HashSet::new(),
        };

        for (pos, rel) in snapshot.relationships.iter().enumerate() {
            let from = rel.from_person_id.as_str();
            let to = rel.to_person_id.as_str();
            if !index.people.contains_key(from) || !index.people.contains_key(to) {
                log::debug!(
                    "relationship `{}` references an unknown person, skipped",
                    rel.id
                );
                continue;
            }
            index.connected.insert(from);
            index.connected.insert(to);
            match rel.kind {
                RelationshipKind::Spouse => {
                    index.spouses.entry(from).or_default().push(pos);
                    if from != to {
                        index.spouses.entry(to).or_default().push(pos);
                    }
                }
                RelationshipKind::ParentChild => {
                    index.children.entry(from).or_default().push(pos);
                    index.parents.entry(to).or_default().push(pos);
                }
            }
        }

        index
    }

    pub fn snapshot(&self) -> &'a FamilySnapshot {
        self.snapshot
    }

    pub fn person(&self, id: &str) -> Option<&'a Person> {
        self.people.get(id).copied()
    }

    /// People in record order, first record per id.
    pub fn people(&self) -> impl Iterator<Item = &'a Person> + '_ {
        self.snapshot
            .people
            .iter()
            .filter(move |person| {
                self.people
                    .get(person.id.as_str())
                    .is_some_and(|first| std::ptr::eq(*first, *person))
            })
    }

    fn relationship(&self, pos: usize) -> &'a Relationship {
        &self.snapshot.relationships[pos]
    }

    fn lookup<'s>(
        &'s self,
        table: &'s HashMap<&'a str, Vec<usize>>,
        id: &str,
    ) -> impl Iterator<Item = &'a Relationship> + use<'s, 'a> {
        table
            .get(id)
            .into_iter()
            .flatten()
            .map(move |pos| self.relationship(*pos))
    }

    /// Whether the person takes part in at least one well-formed relationship.
    pub fn is_connected(&self, id: &str) -> bool {
        self.connected.contains(id)
    }

    /// Whether the person is recorded as someone's child.
    pub fn is_child(&self, id: &str) -> bool {
        self.parents.get(id).is_some_and(|list| !list.is_empty())
    }

    pub fn spouse_relationships(
        &self,
        id: &str,
    ) -> impl Iterator<Item = &'a Relationship> + use<'_, 'a> {
        self.lookup(&self.spouses, id)
    }

    /// The partner from the earliest spouse relationship touching `id`.
    pub fn first_spouse(&self, id: &str) -> Option<&'a Person> {
        self.spouse_relationships(id)
            .filter_map(|rel| rel.other(id))
            .find(|other| *other != id)
            .and_then(|other| self.person(other))
    }

    /// Parents of `id`, one entry per recorded relationship.
    pub fn parents_of(&self, id: &str) -> Vec<&'a Person> {
        self.lookup(&self.parents, id)
            .filter_map(|rel| self.person(&rel.from_person_id))
            .collect()
    }

    /// Children of a person and, if given, their spouse, in relationship
    /// order and without repeats.
    pub fn children_of_couple(&self, id: &str, spouse: Option<&str>) -> Vec<&'a Person> {
        let mut positions: Vec<usize> = self.children.get(id).cloned().unwrap_or_default();
        if let Some(spouse) = spouse
            && let Some(list) = self.children.get(spouse)
        {
            positions.extend(list.iter().copied());
            positions.sort_unstable();
        }
        let mut seen = HashSet::new();
        positions
            .into_iter()
            .map(|pos| self.relationship(pos))
            .filter(|&rel| seen.insert(rel.to_person_id.as_str()))
            .filter_map(|rel| self.person(&rel.to_person_id))
            .collect()
    }

    /// The spouse relationship linking `a` and `b`, in either direction.
    pub fn spouse_relationship(&self, a: &str, b: &str) -> Option<&'a Relationship> {
        self.spouse_relationships(a).find(|rel| rel.other(a) == Some(b))
    }

    /// The first parent/child relationship from any of `parents` to `child`.
    pub fn parent_relationship(&self, parents: &[&str], child: &str) -> Option<&'a Relationship> {
        self.lookup(&self.parents, child)
            .find(|rel| parents.contains(&rel.from_person_id.as_str()))
    }

    /// Every relationship that survived indexing, in record order.
    pub fn relationships(&self) -> impl Iterator<Item = &'a Relationship> + '_ {
        self.snapshot.relationships.iter().filter(move |rel| {
            self.people.contains_key(rel.from_person_id.as_str())
                && self.people.contains_key(rel.to_person_id.as_str())
        })
    }
}
