use crate::config::{DisplaySettings, LayoutConfig, RenderConfig};
use crate::ir::Person;
use crate::theme::Theme;
use crate::view::{Anchor, EdgeKind, ViewModel, ViewNode};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

const LINE_HEIGHT: f32 = 1.4;
const CARD_PADDING: f32 = 12.0;

/// Renders a static preview of the view model.
pub fn render_svg<H>(
    view: &ViewModel<H>,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
) -> String {
    let pad = render.padding;
    let (min_x, min_y) = (view.bounds.x - pad, view.bounds.y - pad);
    let width = (view.bounds.width + pad * 2.0).max(200.0);
    let height = (view.bounds.height + pad * 2.0).max(200.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{min_x:.2} {min_y:.2} {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect x=\"{min_x:.2}\" y=\"{min_y:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    let nodes: HashMap<&str, &ViewNode<H>> =
        view.nodes.iter().map(|node| (node.id.as_str(), node)).collect();

    for edge in &view.edges {
        let (Some(source), Some(target)) = (
            nodes.get(edge.source_person_id.as_str()),
            nodes.get(edge.target_person_id.as_str()),
        ) else {
            continue;
        };
        let start = anchor_point(source, edge.source_anchor);
        let end = anchor_point(target, edge.target_anchor);
        let d = bezier_path(start, edge.source_anchor, end, edge.target_anchor, config);
        let (stroke, dash) = match edge.kind {
            EdgeKind::Spouse => (theme.spouse_line_color.as_str(), " stroke-dasharray=\"6 4\""),
            EdgeKind::ParentChild => (theme.line_color.as_str(), ""),
        };
        svg.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"2\"{dash} data-edge=\"{}\"/>",
            escape_xml(&edge.id)
        ));
    }

    for node in &view.nodes {
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"10\" ry=\"10\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            node.position.x,
            node.position.y,
            node.size.width,
            node.size.height,
            card_fill(&node.payload.person, theme),
            theme.node_border
        ));
        let lines = card_lines(&node.payload.person, &node.payload.display.settings);
        svg.push_str(&card_text_svg(node, &lines, theme));
    }

    svg.push_str("</svg>");
    svg
}

fn card_fill<'a>(person: &'a Person, theme: &'a Theme) -> &'a str {
    person.field_str("color").unwrap_or(theme.node_fill.as_str())
}

/// Name first, then whichever details the display settings enable.
fn card_lines(person: &Person, settings: &DisplaySettings) -> Vec<String> {
    let mut lines = vec![person.display_name()];
    if settings.show_father_name
        && let Some(father) = person.field_str("fatherName")
    {
        lines.push(father.to_string());
    }
    let birth = person.field_str("birthDate").filter(|_| settings.show_birth_date);
    let death = person.field_str("deathDate").filter(|_| settings.show_death_date);
    match (birth, death) {
        (Some(birth), Some(death)) => lines.push(format!("{birth} - {death}")),
        (Some(birth), None) => lines.push(format!("b. {birth}")),
        (None, Some(death)) => lines.push(format!("d. {death}")),
        (None, None) => {}
    }
    let optional = [
        (settings.show_birth_place, "birthPlace"),
        (settings.show_occupation, "occupation"),
        (settings.show_current_place, "currentPlace"),
    ];
    for (enabled, key) in optional {
        if enabled && let Some(value) = person.field_str(key) {
            lines.push(value.to_string());
        }
    }
    lines
}

fn card_text_svg<H>(node: &ViewNode<H>, lines: &[String], theme: &Theme) -> String {
    let x = node.position.x + node.size.width / 2.0;
    let y = node.position.y + CARD_PADDING + theme.font_size;
    let mut text = format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        theme.font_family, theme.font_size, theme.text_color
    );
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            text.push_str(&format!(
                "<tspan x=\"{x:.2}\" dy=\"0\" font-weight=\"600\">{}</tspan>",
                escape_xml(line)
            ));
        } else {
            let dy = theme.font_size * LINE_HEIGHT;
            text.push_str(&format!(
                "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\" fill=\"{}\">{}</tspan>",
                theme.muted_text_color,
                escape_xml(line)
            ));
        }
    }
    text.push_str("</text>");
    text
}

fn anchor_point<H>(node: &ViewNode<H>, anchor: Anchor) -> (f32, f32) {
    let (x, y) = (node.position.x, node.position.y);
    let (w, h) = (node.size.width, node.size.height);
    match anchor {
        Anchor::Top => (x + w / 2.0, y),
        Anchor::Bottom => (x + w / 2.0, y + h),
        Anchor::Left => (x, y + h / 2.0),
        Anchor::Right => (x + w, y + h / 2.0),
    }
}

fn anchor_direction(anchor: Anchor) -> (f32, f32) {
    match anchor {
        Anchor::Top => (0.0, -1.0),
        Anchor::Bottom => (0.0, 1.0),
        Anchor::Left => (-1.0, 0.0),
        Anchor::Right => (1.0, 0.0),
    }
}

fn bezier_path(
    start: (f32, f32),
    start_anchor: Anchor,
    end: (f32, f32),
    end_anchor: Anchor,
    config: &LayoutConfig,
) -> String {
    let distance = ((end.0 - start.0).powi(2) + (end.1 - start.1).powi(2)).sqrt();
    let reach = (distance * 0.4).clamp(config.h_spacing * 0.5, config.v_spacing * 0.5);
    let (sx, sy) = anchor_direction(start_anchor);
    let (ex, ey) = anchor_direction(end_anchor);
    format!(
        "M {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
        start.0,
        start.1,
        start.0 + sx * reach,
        start.1 + sy * reach,
        end.0 + ex * reach,
        end.1 + ey * reach,
        end.0,
        end.1
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
