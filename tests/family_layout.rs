use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use kinship_layout::{
    Anchor, DisplayContext, DisplaySettings, EdgeKind, FamilySnapshot, HierarchyNode, LayoutConfig,
    NodeChange, Person, Relationship, RelationshipIndex, ViewModel, build_forest, compute_layout,
    compute_view,
};

const FIXTURES: [&str; 5] = [
    "couple_two_children.json",
    "duplicate_spouse.json",
    "three_generations.json",
    "remarriage.json",
    "pinned.json",
];

fn load_fixture(name: &str) -> FamilySnapshot {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    FamilySnapshot::load(&path).unwrap_or_else(|err| panic!("{name}: {err}"))
}

fn view_of(snapshot: &FamilySnapshot, config: &LayoutConfig) -> ViewModel {
    let context = DisplayContext::new(DisplaySettings::default(), snapshot.is_locked);
    compute_view(snapshot, None, &context, config)
}

fn has_pins(node: &HierarchyNode) -> bool {
    let mut pinned = false;
    node.walk(&mut |member, _| pinned |= member.is_pinned());
    pinned
}

/// Horizontal extent per depth of an already positioned subtree.
fn extent(node: &HierarchyNode, config: &LayoutConfig) -> Vec<(f32, f32)> {
    let mut levels: Vec<(f32, f32)> = Vec::new();
    node.walk(&mut |member, depth| {
        let span = (member.x, member.x + config.node_width);
        match levels.get_mut(depth) {
            Some(level) => *level = (level.0.min(span.0), level.1.max(span.1)),
            None => levels.push(span),
        }
    });
    levels
}

/// Packed siblings may sit exactly `h_spacing` apart.
fn check_siblings_apart(node: &HierarchyNode, config: &LayoutConfig, fixture: &str) {
    for pair in node.children.windows(2) {
        let left = extent(&pair[0], config);
        let right = extent(&pair[1], config);
        for (depth, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            assert!(
                l.1 + config.h_spacing <= r.0,
                "{fixture}: `{}` and `{}` overlap at depth {depth}",
                pair[0].id(),
                pair[1].id()
            );
        }
    }
    for child in &node.children {
        check_siblings_apart(child, config, fixture);
    }
}

fn check_generations(node: &HierarchyNode, config: &LayoutConfig, fixture: &str) {
    if let Some(spouse) = node.spouse.as_deref()
        && !node.is_pinned()
        && !spouse.is_pinned()
    {
        assert_eq!(
            (spouse.x, spouse.y),
            (node.x + config.node_width + config.h_spacing, node.y),
            "{fixture}: spouse of `{}` not beside them",
            node.id()
        );
    }
    for child in &node.children {
        if !node.is_pinned() && !child.is_pinned() {
            assert_eq!(
                child.y,
                node.y + config.v_spacing,
                "{fixture}: `{}` not one generation below `{}`",
                child.id(),
                node.id()
            );
        }
        check_generations(child, config, fixture);
    }
}

#[test]
fn every_person_is_placed_at_most_once() {
    for fixture in FIXTURES {
        let snapshot = load_fixture(fixture);
        let index = RelationshipIndex::new(&snapshot);
        let forest = build_forest(&index, None);
        let mut placed = HashSet::new();
        for tree in &forest {
            for id in tree.placed_ids() {
                assert!(placed.insert(id.to_string()), "{fixture}: `{id}` placed twice");
            }
        }

        let view = view_of(&snapshot, &LayoutConfig::default());
        let mut emitted = HashSet::new();
        for node in &view.nodes {
            assert!(emitted.insert(node.id.clone()), "{fixture}: node `{}` emitted twice", node.id);
            assert!(snapshot.person(&node.id).is_some());
        }
    }
}

#[test]
fn sibling_subtrees_never_overlap() {
    let config = LayoutConfig::default();
    for fixture in FIXTURES {
        let snapshot = load_fixture(fixture);
        let index = RelationshipIndex::new(&snapshot);
        let layout = compute_layout(&index, None, &config);
        for tree in layout.forest.iter().filter(|tree| !has_pins(tree)) {
            check_siblings_apart(tree, &config, fixture);
        }
        for pair in layout.trees.windows(2) {
            assert!(pair[0].max_x + config.forest_gap <= pair[1].min_x, "{fixture}: trees overlap");
        }
    }
}

#[test]
fn spouses_sit_together_and_generations_step_down() {
    let config = LayoutConfig::default();
    for fixture in FIXTURES {
        let snapshot = load_fixture(fixture);
        let index = RelationshipIndex::new(&snapshot);
        let layout = compute_layout(&index, None, &config);
        for tree in &layout.forest {
            check_generations(tree, &config, fixture);
        }
    }
}

#[test]
fn edges_match_relationships_between_visible_people() {
    for fixture in FIXTURES {
        let snapshot = load_fixture(fixture);
        let view = view_of(&snapshot, &LayoutConfig::default());
        let visible: HashSet<&str> = view.nodes.iter().map(|node| node.id.as_str()).collect();

        let expected: BTreeSet<&str> = snapshot
            .relationships
            .iter()
            .filter(|rel| {
                visible.contains(rel.from_person_id.as_str())
                    && visible.contains(rel.to_person_id.as_str())
            })
            .map(|rel| rel.id.as_str())
            .collect();

        let mut actual = BTreeSet::new();
        for edge in &view.edges {
            assert!(actual.insert(edge.id.as_str()), "{fixture}: edge `{}` emitted twice", edge.id);
        }
        assert_eq!(actual, expected, "{fixture}");
    }
}

#[test]
fn couple_with_two_children() {
    let snapshot = load_fixture("couple_two_children.json");
    let config = LayoutConfig::default();
    let index = RelationshipIndex::new(&snapshot);
    let forest = build_forest(&index, None);
    assert_eq!(forest.len(), 1);
    let a = &forest[0];
    assert_eq!(a.id(), "A");
    assert_eq!(a.spouse.as_deref().map(|s| s.id()), Some("B"));
    let children: Vec<&str> = a.children.iter().map(|child| child.id()).collect();
    assert_eq!(children, vec!["C", "D"]);

    let view = view_of(&snapshot, &config);
    let pos = |id: &str| {
        let node = view.node(id).unwrap();
        (node.position.x, node.position.y)
    };
    assert_eq!(pos("A"), (0.0, 0.0));
    assert_eq!(pos("B"), (250.0, 0.0));
    assert_eq!(pos("C"), (0.0, 350.0));
    assert_eq!(pos("D"), (250.0, 350.0));

    let spouse = view.edge("s1").unwrap();
    assert_eq!(spouse.kind, EdgeKind::Spouse);
    assert_eq!((spouse.source_anchor, spouse.target_anchor), (Anchor::Right, Anchor::Left));
    let child = view.edge("p2").unwrap();
    assert_eq!(child.kind, EdgeKind::ParentChild);
    assert_eq!(child.source_person_id, "B");
    assert_eq!((child.source_anchor, child.target_anchor), (Anchor::Bottom, Anchor::Top));
}

#[test]
fn spouse_pair_recorded_twice_is_one_couple() {
    let snapshot = load_fixture("duplicate_spouse.json");
    let index = RelationshipIndex::new(&snapshot);
    let forest = build_forest(&index, None);
    assert_eq!(forest.len(), 1);
    let a = &forest[0];
    assert_eq!(a.id(), "A");
    assert_eq!(a.spouse.as_deref().map(|s| s.id()), Some("B"));
    let children: Vec<&str> = a.children.iter().map(|child| child.id()).collect();
    assert_eq!(children, vec!["C", "D"]);

    let view = view_of(&snapshot, &LayoutConfig::default());
    assert_eq!(view.nodes.len(), 4);
    let spouse_edges: Vec<&str> = view
        .edges
        .iter()
        .filter(|edge| edge.kind == EdgeKind::Spouse)
        .map(|edge| edge.id.as_str())
        .collect();
    assert_eq!(spouse_edges, vec!["s1", "s2"]);
    let reverse = view.edge("s2").unwrap();
    assert_eq!(reverse.source_person_id, "B");
    assert_eq!((reverse.source_anchor, reverse.target_anchor), (Anchor::Left, Anchor::Right));
}

#[test]
fn loner_grid_pushes_forest_down() {
    let snapshot = load_fixture("three_generations.json");
    let config = LayoutConfig::default();
    let view = view_of(&snapshot, &config);
    let loner = view.node("loner").unwrap();
    assert_eq!((loner.position.x, loner.position.y), (0.0, 0.0));
    let g1 = view.node("g1").unwrap();
    assert_eq!(g1.position.y, config.v_spacing);
    assert!(view.edge("r-p12").is_none());
    assert_eq!(view.nodes.len(), snapshot.people.len());
}

#[test]
fn remarried_person_keeps_first_spouse() {
    let snapshot = load_fixture("remarriage.json");
    let config = LayoutConfig::default();
    let view = view_of(&snapshot, &config);

    let m = view.node("m").unwrap();
    let w1 = view.node("w1").unwrap();
    assert_eq!(w1.position.x, m.position.x + config.node_width + config.h_spacing);
    assert!(view.node("w2").is_some());
    assert!(view.edge("e2").is_some());

    // pure parent loops have no root and stay off the canvas
    assert!(view.node("x").is_none());
    assert!(view.node("y").is_none());
}

#[test]
fn persisted_position_and_size_are_honoured() {
    let snapshot = load_fixture("pinned.json");
    let config = LayoutConfig::default();
    let view = view_of(&snapshot, &config);

    let b = view.node("b").unwrap();
    assert_eq!((b.position.x, b.position.y), (150.0, 300.0));
    let c = view.node("c").unwrap();
    assert_eq!((c.size.width, c.size.height), (260.0, 140.0));
    // a lone x is not a pin
    let d = view.node("d").unwrap();
    assert_eq!(d.position.y, config.v_spacing);
    assert!(view.nodes.iter().all(|node| node.payload.display.locked));

    for id in ["a", "c", "d"] {
        let node = view.node(id).unwrap();
        let clear = node.position.x + config.node_width + config.h_spacing <= b.position.x
            || b.position.x + config.node_width + config.h_spacing <= node.position.x;
        assert!(clear, "`{id}` overlaps the pinned card");
    }
}

#[test]
fn self_parent_terminates() {
    let snapshot = FamilySnapshot {
        people: vec![Person::new("X"), Person::new("Y")],
        relationships: vec![
            Relationship::parent_child("loop", "X", "X"),
            Relationship::parent_child("real", "Y", "X"),
        ],
        ..Default::default()
    };
    let view = view_of(&snapshot, &LayoutConfig::default());
    let ids: Vec<&str> = view.nodes.iter().map(|node| node.id.as_str()).collect();
    assert_eq!(ids, vec!["Y", "X"]);
}

#[test]
fn dragged_node_stays_where_dropped() {
    let mut snapshot = load_fixture("couple_two_children.json");
    let moved = snapshot.apply_node_change(&NodeChange::Moved {
        person_id: "D".to_string(),
        x: 900.0,
        y: 700.0,
    });
    assert_eq!(moved, 1);
    let view = view_of(&snapshot, &LayoutConfig::default());
    let d = view.node("D").unwrap();
    assert_eq!((d.position.x, d.position.y), (900.0, 700.0));
    assert_eq!(view.node("C").unwrap().position.y, 350.0);
}

#[test]
fn narrow_viewport_tightens_spacing() {
    let snapshot = load_fixture("couple_two_children.json");
    let config = LayoutConfig::default().for_viewport(480.0);
    let view = view_of(&snapshot, &config);
    let a = view.node("A").unwrap();
    let b = view.node("B").unwrap();
    assert_eq!(b.position.x - a.position.x, config.node_width + config.compact_h_spacing);
}

#[test]
fn view_serializes_for_the_renderer() {
    let snapshot = load_fixture("couple_two_children.json");
    let view = view_of(&snapshot, &LayoutConfig::default());
    let json = serde_json::to_value(&view).unwrap();
    let edge = &json["edges"][0];
    assert_eq!(edge["sourcePersonId"], "A");
    assert_eq!(edge["sourceAnchor"], "right");
    assert_eq!(edge["kind"], "spouse");
    assert_eq!(json["nodes"][0]["payload"]["person"]["firstName"], "Anna");
}
