use super::types::GridPlacement;
use crate::config::LayoutConfig;
use crate::ir::Person;

/// Lays out people without any relationship as a wrapping row grid.
///
/// Returns the placements and the y at which the family forest should start
/// so it sits below the grid.
pub fn layout_unconnected<'a>(
    people: impl IntoIterator<Item = &'a Person>,
    config: &LayoutConfig,
) -> (Vec<GridPlacement>, f32) {
    let step = config.node_width + config.h_spacing;
    let wrap_at = config.grid_width - config.node_width;
    let mut placements = Vec::new();
    let mut x = 0.0;
    let mut y = 0.0;
    let mut last_row: Option<f32> = None;

    for person in people {
        if let Some((px, py)) = person.placement.pinned() {
            placements.push(GridPlacement {
                person: person.clone(),
                x: px,
                y: py,
            });
            continue;
        }
        placements.push(GridPlacement {
            person: person.clone(),
            x,
            y,
        });
        last_row = Some(y);
        x += step;
        if x > wrap_at {
            x = 0.0;
            y += config.v_spacing;
        }
    }

    let forest_y = last_row.map_or(0.0, |row| row + config.v_spacing);
    (placements, forest_y)
}
