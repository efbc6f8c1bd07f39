//! Tidy-tree placement for family hierarchies.
//!
//! Each tree is laid out in two passes. The first pass walks bottom-up,
//! packing sibling subtrees as tightly as their contours allow and centring
//! every couple over its children; the result is stored on the nodes in
//! local coordinates. The second pass walks top-down turning those into
//! absolute positions. Pinned people are then taken into account, and
//! finally trees are packed left to right.

use super::types::{Contour, HierarchyNode, TreeBounds};
use crate::config::LayoutConfig;

/// Width of a node's row slot, including a spouse column.
fn unit_width(node: &HierarchyNode, config: &LayoutConfig) -> f32 {
    if node.spouse.is_some() {
        config.couple_width()
    } else {
        config.node_width
    }
}

fn first_pass(node: &mut HierarchyNode, config: &LayoutConfig) {
    for child in node.children.iter_mut() {
        first_pass(child, config);
    }

    let width = unit_width(node, config);
    if node.children.is_empty() {
        node.prelim = 0.0;
        node.contour = Contour::single(0.0, width);
        return;
    }

    let mut below = Contour::default();
    for (idx, child) in node.children.iter_mut().enumerate() {
        let offset = if idx == 0 {
            0.0
        } else {
            below.separation(&child.contour, config.h_spacing)
        };
        child.modifier = offset;
        below.merge(&child.contour, offset, 0);
    }

    let first = &node.children[0];
    let last = &node.children[node.children.len() - 1];
    let span_left = first.modifier + first.prelim;
    let span_right = last.modifier + last.prelim + unit_width(last, config);
    node.prelim = (span_left + span_right) / 2.0 - width / 2.0;

    let mut contour = Contour::single(node.prelim, node.prelim + width);
    contour.merge(&below, 0.0, 1);
    node.contour = contour;
}

fn second_pass(
    node: &mut HierarchyNode,
    offset: f32,
    depth: usize,
    origin_y: f32,
    config: &LayoutConfig,
) {
    let computed = (
        offset + node.prelim,
        origin_y + depth as f32 * config.v_spacing,
    );
    let (x, y) = node.person.placement.pinned().unwrap_or(computed);
    node.x = x;
    node.y = y;

    if let Some(spouse) = node.spouse.as_deref_mut() {
        let beside = (x + config.node_width + config.h_spacing, y);
        (spouse.x, spouse.y) = spouse.person.placement.pinned().unwrap_or(beside);
    }

    for child in node.children.iter_mut() {
        let child_offset = offset + child.modifier;
        second_pass(child, child_offset, depth + 1, origin_y, config);
    }
}

/// Absolute per-depth extent of a positioned subtree.
fn absolute_contour(node: &HierarchyNode, config: &LayoutConfig) -> Contour {
    let mut contour = Contour::default();
    node.walk(&mut |member, depth| {
        let span = Contour::single(member.x, member.x + config.node_width);
        contour.merge(&span, 0.0, depth);
    });
    contour
}

/// Moves every unpinned node of the subtree right by `dx`. An unpinned
/// spouse stays beside its partner.
fn shift_unpinned(node: &mut HierarchyNode, dx: f32, config: &LayoutConfig) {
    if !node.is_pinned() {
        node.x += dx;
    }
    let anchor = node.x;
    if let Some(spouse) = node.spouse.as_deref_mut()
        && !spouse.is_pinned()
    {
        spouse.x = anchor + config.node_width + config.h_spacing;
    }
    for child in node.children.iter_mut() {
        shift_unpinned(child, dx, config);
    }
}

/// Pushes unpinned sibling subtrees clear of pinned ones.
///
/// Runs post-order so a subtree is settled internally before it is moved as
/// a whole. Without pins every shift comes out non-positive and nothing moves.
fn resolve_pins(node: &mut HierarchyNode, config: &LayoutConfig) {
    for child in node.children.iter_mut() {
        resolve_pins(child, config);
    }

    let gap = config.h_spacing;
    let pinned: Vec<Contour> = node
        .children
        .iter()
        .filter(|child| child.is_pinned())
        .map(|child| absolute_contour(child, config))
        .collect();

    let mut placed = Contour::default();
    for (idx, child) in node.children.iter_mut().enumerate() {
        let mut extent = absolute_contour(child, config);
        if !child.is_pinned() {
            let start = if idx == 0 {
                0.0
            } else {
                placed.separation(&extent, gap).max(0.0)
            };
            let shift = clear_of_pinned(&extent, start, &pinned, gap);
            if shift > 0.0 {
                log::debug!("shifting `{}` by {shift} to clear pinned siblings", child.id());
                shift_unpinned(child, shift, config);
                extent = absolute_contour(child, config);
            }
        }
        placed.merge(&extent, 0.0, 0);
    }
}

/// Smallest shift at or above `start` that keeps `extent` at least `gap`
/// away from every pinned sibling subtree at every shared depth.
///
/// The shift only grows, so each pinned level can push at most once.
fn clear_of_pinned(extent: &Contour, start: f32, pinned: &[Contour], gap: f32) -> f32 {
    let mut shift = start;
    loop {
        let mut moved = false;
        for obstacle in pinned {
            for (&(left, right), &(pin_left, pin_right)) in
                extent.levels.iter().zip(obstacle.levels.iter())
            {
                if left + shift < pin_right + gap && right + shift + gap > pin_left {
                    shift = pin_right + gap - left;
                    moved = true;
                }
            }
        }
        if !moved {
            return shift;
        }
    }
}

fn tree_bounds(root: &HierarchyNode, config: &LayoutConfig) -> TreeBounds {
    let mut bounds = TreeBounds {
        min_x: f32::MAX,
        max_x: f32::MIN,
    };
    root.walk(&mut |node, _| {
        bounds.min_x = bounds.min_x.min(node.x);
        bounds.max_x = bounds.max_x.max(node.x + config.node_width);
    });
    bounds
}

/// Positions one tree with its left edge at `left`, generations starting at
/// `origin_y`.
pub fn layout_tree(
    root: &mut HierarchyNode,
    left: f32,
    origin_y: f32,
    config: &LayoutConfig,
) -> TreeBounds {
    first_pass(root, config);
    let offset = left - root.contour.leftmost();
    second_pass(root, offset, 0, origin_y, config);
    resolve_pins(root, config);
    tree_bounds(root, config)
}

/// Positions every tree of the forest, packing them left to right.
pub fn layout_forest(
    roots: &mut [HierarchyNode],
    origin_y: f32,
    config: &LayoutConfig,
) -> Vec<TreeBounds> {
    let mut cursor = 0.0;
    let mut bounds = Vec::with_capacity(roots.len());
    for root in roots.iter_mut() {
        let tree = layout_tree(root, cursor, origin_y, config);
        cursor = tree.max_x + config.forest_gap;
        bounds.push(tree);
    }
    bounds
}
