mod grid;
pub mod hierarchy;
pub mod index;
mod tidy;
pub(crate) mod types;
pub use grid::layout_unconnected;
pub use hierarchy::{HierarchyBuilder, VisitedSet, build_forest, build_tree};
pub use index::RelationshipIndex;
pub use tidy::{layout_forest, layout_tree};
pub use types::*;

use crate::config::LayoutConfig;

/// Runs the builder and the layout engine over one snapshot.
///
/// People without relationships go to the grid; everyone else is arranged
/// into a forest of family trees below it. `preferred_root` overrides the
/// snapshot's own root hint.
pub fn compute_layout(
    index: &RelationshipIndex<'_>,
    preferred_root: Option<&str>,
    config: &LayoutConfig,
) -> Layout {
    let loose = index.people().filter(|person| !index.is_connected(&person.id));
    let (unconnected, forest_y) = layout_unconnected(loose, config);

    let root_hint = preferred_root.or(index.snapshot().root_person_id.as_deref());
    let mut forest = build_forest(index, root_hint);
    let trees = layout_forest(&mut forest, forest_y, config);

    let mut bounds = Bounds::empty();
    for placement in &unconnected {
        let (width, height) = node_size(&placement.person, config);
        bounds.include(placement.x, placement.y, width, height);
    }
    for tree in &forest {
        tree.walk(&mut |node, _| {
            let (width, height) = node_size(&node.person, config);
            bounds.include(node.x, node.y, width, height);
        });
    }

    log::debug!(
        "layout: {} tree(s), {} unconnected, {}x{}",
        forest.len(),
        unconnected.len(),
        bounds.width(),
        bounds.height()
    );

    Layout {
        forest,
        trees,
        unconnected,
        bounds,
    }
}

/// Rendered size of a person's card: the persisted size when the user
/// resized it, the configured default otherwise.
pub fn node_size(person: &crate::ir::Person, config: &LayoutConfig) -> (f32, f32) {
    (
        person.width.unwrap_or(config.node_width),
        person.height.unwrap_or(config.node_height),
    )
}
