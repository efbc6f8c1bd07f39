//! Projection of a positioned forest into renderer-facing nodes and edges.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::{DisplaySettings, LayoutConfig};
use crate::ir::{Person, Relationship, RelationshipKind};
use crate::layout::{Bounds, HierarchyNode, Layout, RelationshipIndex, node_size};

/// Side of a card an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Spouse,
    ParentChild,
}

impl From<RelationshipKind> for EdgeKind {
    fn from(kind: RelationshipKind) -> Self {
        match kind {
            RelationshipKind::Spouse => EdgeKind::Spouse,
            RelationshipKind::ParentChild => EdgeKind::ParentChild,
        }
    }
}

/// Presentation state handed through to every node untouched.
///
/// `hooks` is whatever the renderer wants back on each card (callbacks for
/// select, edit, delete and resize in an interactive front end).
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayContext<H = ()> {
    pub settings: DisplaySettings,
    pub locked: bool,
    pub hooks: H,
}

impl DisplayContext<()> {
    pub fn new(settings: DisplaySettings, locked: bool) -> Self {
        Self {
            settings,
            locked,
            hooks: (),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodePayload<H = ()> {
    pub person: Person,
    pub display: DisplayContext<H>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewNode<H = ()> {
    pub id: String,
    pub position: Position,
    pub size: Size,
    pub payload: NodePayload<H>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEdge {
    pub id: String,
    pub source_person_id: String,
    pub target_person_id: String,
    pub source_anchor: Anchor,
    pub target_anchor: Anchor,
    pub kind: EdgeKind,
}

/// Nodes and edges produced by one projection step.
#[derive(Debug, Clone, Serialize)]
pub struct ViewFragment<H = ()> {
    pub nodes: Vec<ViewNode<H>>,
    pub edges: Vec<ViewEdge>,
}

impl<H> Default for ViewFragment<H> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<H> ViewFragment<H> {
    fn append(&mut self, other: ViewFragment<H>) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
    }
}

/// Everything the renderer needs for one tree view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewModel<H = ()> {
    pub nodes: Vec<ViewNode<H>>,
    pub edges: Vec<ViewEdge>,
    pub bounds: ViewBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<Bounds> for ViewBounds {
    fn from(bounds: Bounds) -> Self {
        if bounds.is_empty() {
            return Self {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            };
        }
        Self {
            x: bounds.min_x,
            y: bounds.min_y,
            width: bounds.width(),
            height: bounds.height(),
        }
    }
}

impl<H> ViewModel<H> {
    pub fn node(&self, id: &str) -> Option<&ViewNode<H>> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&ViewEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }
}

/// Anchors for a spouse edge: the card further left connects from its
/// right side so the line never runs behind either card.
fn spouse_anchors(source_x: f32, target_x: f32) -> (Anchor, Anchor) {
    if source_x < target_x {
        (Anchor::Right, Anchor::Left)
    } else {
        (Anchor::Left, Anchor::Right)
    }
}

fn parent_edge(relationship: &Relationship) -> ViewEdge {
    ViewEdge {
        id: relationship.id.clone(),
        source_person_id: relationship.from_person_id.clone(),
        target_person_id: relationship.to_person_id.clone(),
        source_anchor: Anchor::Bottom,
        target_anchor: Anchor::Top,
        kind: EdgeKind::ParentChild,
    }
}

fn spouse_edge(relationship: &Relationship, source_x: f32, target_x: f32) -> ViewEdge {
    let (source_anchor, target_anchor) = spouse_anchors(source_x, target_x);
    ViewEdge {
        id: relationship.id.clone(),
        source_person_id: relationship.from_person_id.clone(),
        target_person_id: relationship.to_person_id.clone(),
        source_anchor,
        target_anchor,
        kind: EdgeKind::Spouse,
    }
}

/// Walks positioned hierarchies and emits view nodes and edges.
///
/// The processed sets live for the whole forest: a person or relationship
/// reachable from two trees is emitted once.
pub struct Projector<'i, 'a, H> {
    index: &'i RelationshipIndex<'a>,
    config: &'i LayoutConfig,
    context: &'i DisplayContext<H>,
    processed_nodes: HashSet<String>,
    processed_relationships: HashSet<String>,
}

impl<'i, 'a, H: Clone> Projector<'i, 'a, H> {
    pub fn new(
        index: &'i RelationshipIndex<'a>,
        context: &'i DisplayContext<H>,
        config: &'i LayoutConfig,
    ) -> Self {
        Self {
            index,
            config,
            context,
            processed_nodes: HashSet::new(),
            processed_relationships: HashSet::new(),
        }
    }

    pub fn processed_nodes(&self) -> &HashSet<String> {
        &self.processed_nodes
    }

    pub fn processed_relationships(&self) -> &HashSet<String> {
        &self.processed_relationships
    }

    fn view_node(&self, person: &Person, x: f32, y: f32) -> ViewNode<H> {
        let (width, height) = node_size(person, self.config);
        ViewNode {
            id: person.id.clone(),
            position: Position { x, y },
            size: Size { width, height },
            payload: NodePayload {
                person: person.clone(),
                display: self.context.clone(),
            },
        }
    }

    /// Emits a node for `person` unless one was emitted before.
    pub fn emit_node(&mut self, person: &Person, x: f32, y: f32, out: &mut ViewFragment<H>) {
        if self.processed_nodes.insert(person.id.clone()) {
            out.nodes.push(self.view_node(person, x, y));
        }
    }

    fn claim(&mut self, relationship: &Relationship) -> bool {
        self.processed_relationships.insert(relationship.id.clone())
    }

    /// Projects one positioned node, its spouse, its parent stubs and its
    /// whole subtree.
    pub fn project(&mut self, node: &HierarchyNode) -> ViewFragment<H> {
        let mut out = ViewFragment::default();
        self.emit_node(&node.person, node.x, node.y, &mut out);

        if let Some(spouse) = node.spouse.as_deref() {
            self.emit_node(&spouse.person, spouse.x, spouse.y, &mut out);
            if let Some(rel) = self.index.spouse_relationship(node.id(), spouse.id())
                && self.claim(rel)
            {
                let (source_x, target_x) = if rel.from_person_id == node.id() {
                    (node.x, spouse.x)
                } else {
                    (spouse.x, node.x)
                };
                out.edges.push(spouse_edge(rel, source_x, target_x));
            }
            self.project_parent_stubs(spouse, &mut out);
        }

        let mut couple = vec![node.id()];
        if let Some(spouse) = node.spouse.as_deref() {
            couple.push(spouse.id());
        }
        for child in &node.children {
            if let Some(rel) = self.index.parent_relationship(&couple, child.id())
                && self.claim(rel)
            {
                out.edges.push(parent_edge(rel));
            }
            let fragment = self.project(child);
            out.append(fragment);
        }

        self.project_parent_stubs(node, &mut out);
        out
    }

    fn project_parent_stubs(&mut self, node: &HierarchyNode, out: &mut ViewFragment<H>) {
        for parent in &node.parents {
            if let Some(rel) = self.index.parent_relationship(&[parent.id()], node.id())
                && self.claim(rel)
            {
                out.edges.push(parent_edge(rel));
            }
        }
    }

    /// Reconciles edges with the emitted nodes: drops edges pointing at a
    /// person that never became a node and adds every relationship whose
    /// two people are both on screen but that no traversal path produced.
    pub fn complete_edges(&mut self, view: &mut ViewFragment<H>) {
        let positions: std::collections::HashMap<&str, f32> = view
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.position.x))
            .collect();

        let before = view.edges.len();
        view.edges.retain(|edge| {
            positions.contains_key(edge.source_person_id.as_str())
                && positions.contains_key(edge.target_person_id.as_str())
        });
        if view.edges.len() != before {
            log::debug!("dropped {} edge(s) to people not on screen", before - view.edges.len());
        }

        let mut extra = Vec::new();
        for rel in self.index.relationships() {
            let (Some(source_x), Some(target_x)) = (
                positions.get(rel.from_person_id.as_str()),
                positions.get(rel.to_person_id.as_str()),
            ) else {
                continue;
            };
            if !self.processed_relationships.insert(rel.id.clone()) {
                continue;
            }
            extra.push(match rel.kind {
                RelationshipKind::Spouse => spouse_edge(rel, *source_x, *target_x),
                RelationshipKind::ParentChild => parent_edge(rel),
            });
        }
        view.edges.extend(extra);
    }
}

/// Projects a full layout: the unconnected grid first, then every tree,
/// then edge reconciliation.
pub fn project_layout<H: Clone>(
    layout: &Layout,
    index: &RelationshipIndex<'_>,
    context: &DisplayContext<H>,
    config: &LayoutConfig,
) -> ViewModel<H> {
    let mut projector = Projector::new(index, context, config);
    let mut view = ViewFragment::default();
    for placement in &layout.unconnected {
        projector.emit_node(&placement.person, placement.x, placement.y, &mut view);
    }
    for tree in &layout.forest {
        let fragment = projector.project(tree);
        view.append(fragment);
    }
    projector.complete_edges(&mut view);

    ViewModel {
        nodes: view.nodes,
        edges: view.edges,
        bounds: layout.bounds.into(),
    }
}
