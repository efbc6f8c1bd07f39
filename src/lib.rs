#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod render;
pub mod theme;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, DisplaySettings, LayoutConfig, RenderConfig, load_config};
pub use ir::{FamilySnapshot, NodeChange, Person, Placement, Relationship, RelationshipKind, SnapshotError};
pub use layout::{HierarchyNode, Layout, RelationshipIndex, build_forest, build_tree, compute_layout};
pub use render::render_svg;
pub use theme::Theme;
pub use view::{Anchor, DisplayContext, EdgeKind, ViewEdge, ViewModel, ViewNode, project_layout};

/// Builder, layout and projection in one call.
pub fn compute_view<H: Clone>(
    snapshot: &FamilySnapshot,
    preferred_root: Option<&str>,
    context: &DisplayContext<H>,
    config: &LayoutConfig,
) -> ViewModel<H> {
    let index = RelationshipIndex::new(snapshot);
    let layout = compute_layout(&index, preferred_root, config);
    project_layout(&layout, &index, context, config)
}
