use std::collections::HashSet;

use super::index::RelationshipIndex;
use super::types::HierarchyNode;
use crate::ir::Person;

/// People already placed during one build pass.
///
/// The set is the only thing standing between the builder and cyclic or
/// duplicated relationship data: once an id is in here it is never
/// materialised as a primary node again.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    ids: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `false` if the id was already present.
    pub fn mark(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Builds rooted family hierarchies out of a [`RelationshipIndex`].
pub struct HierarchyBuilder<'i, 'a> {
    index: &'i RelationshipIndex<'a>,
    visited: VisitedSet,
}

impl<'i, 'a> HierarchyBuilder<'i, 'a> {
    pub fn new(index: &'i RelationshipIndex<'a>) -> Self {
        Self {
            index,
            visited: VisitedSet::new(),
        }
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Builds the tree rooted at `root_id`.
    ///
    /// Returns `None` when the id is unknown or the person was already placed
    /// by an earlier call on this builder.
    pub fn build_tree(&mut self, root_id: &str) -> Option<HierarchyNode> {
        let person = self.index.person(root_id)?;
        self.build_node(person)
    }

    fn build_node(&mut self, person: &'a Person) -> Option<HierarchyNode> {
        if !self.visited.mark(&person.id) {
            return None;
        }

        let spouse = self
            .index
            .first_spouse(&person.id)
            .filter(|partner| !self.visited.contains(&partner.id));
        if let Some(partner) = spouse {
            self.visited.mark(&partner.id);
        }

        let children = self
            .index
            .children_of_couple(&person.id, spouse.map(|p| p.id.as_str()));

        let mut node = HierarchyNode::new(person.clone());
        for child in children {
            if child.id == person.id {
                log::debug!("person `{}` is recorded as their own child", person.id);
                continue;
            }
            if let Some(child_node) = self.build_node(child) {
                node.children.push(child_node);
            }
        }
        node.parents = self.parent_stubs(person);
        node.spouse = spouse.map(|partner| {
            let mut spouse_node = HierarchyNode::new(partner.clone());
            spouse_node.parents = self.parent_stubs(partner);
            Box::new(spouse_node)
        });
        Some(node)
    }

    fn parent_stubs(&self, person: &Person) -> Vec<HierarchyNode> {
        self.index
            .parents_of(&person.id)
            .into_iter()
            .filter(|parent| parent.id != person.id)
            .map(|parent| HierarchyNode::new(parent.clone()))
            .collect()
    }

    /// People that start a tree: connected, and nobody's child.
    pub fn root_candidates(&self) -> Vec<&'a Person> {
        self.index
            .people()
            .filter(|person| self.index.is_connected(&person.id) && !self.index.is_child(&person.id))
            .collect()
    }

    /// Builds every tree of the forest, sharing one visited set so a person
    /// pulled into an earlier tree is never rooted again.
    ///
    /// A `preferred_root` is built first when it resolves to a known person.
    pub fn build_forest(&mut self, preferred_root: Option<&str>) -> Vec<HierarchyNode> {
        let mut forest = Vec::new();
        if let Some(root_id) = preferred_root {
            match self.build_tree(root_id) {
                Some(tree) => forest.push(tree),
                None if self.index.person(root_id).is_none() => {
                    log::warn!("root person `{root_id}` not found, using detected roots");
                }
                None => {}
            }
        }
        for root in self.root_candidates() {
            if self.visited.contains(&root.id) {
                continue;
            }
            if let Some(tree) = self.build_tree(&root.id) {
                forest.push(tree);
            }
        }
        log::debug!(
            "built {} tree(s) covering {} people",
            forest.len(),
            self.visited.len()
        );
        forest
    }
}

/// Builds a single tree with a fresh visited set.
pub fn build_tree(index: &RelationshipIndex<'_>, root_id: &str) -> Option<HierarchyNode> {
    HierarchyBuilder::new(index).build_tree(root_id)
}

pub fn build_forest(index: &RelationshipIndex<'_>, preferred_root: Option<&str>) -> Vec<HierarchyNode> {
    HierarchyBuilder::new(index).build_forest(preferred_root)
}
