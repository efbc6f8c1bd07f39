use kinship_layout::{
    DisplayContext, DisplaySettings, FamilySnapshot, LayoutConfig, RenderConfig, Theme, ViewModel,
    compute_view, render_svg,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeLayoutOptions {
    theme: Option<String>,
    root_person_id: Option<String>,
    viewport_width: Option<f32>,
    display: Option<DisplaySettings>,
}

struct Prepared {
    theme: Theme,
    layout: LayoutConfig,
    context: DisplayContext,
    root: Option<String>,
}

fn prepare(snapshot: &FamilySnapshot, options: TreeLayoutOptions) -> Prepared {
    let theme = if options.theme.as_deref() == Some("classic") {
        Theme::classic()
    } else {
        Theme::modern()
    };
    let mut layout = LayoutConfig::default();
    if let Some(width) = options.viewport_width {
        layout = layout.for_viewport(width);
    }
    let settings = options.display.unwrap_or_default();
    Prepared {
        theme,
        layout,
        context: DisplayContext::new(settings, snapshot.is_locked),
        root: options.root_person_id,
    }
}

fn parse_inputs(
    snapshot_json: &str,
    options_json: Option<String>,
) -> Result<(FamilySnapshot, TreeLayoutOptions), JsValue> {
    let snapshot = FamilySnapshot::from_json(snapshot_json)
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    let options = match options_json {
        Some(raw) => serde_json::from_str::<TreeLayoutOptions>(&raw)
            .map_err(|error| JsValue::from_str(&error.to_string()))?,
        None => TreeLayoutOptions::default(),
    };
    Ok((snapshot, options))
}

fn view_for(snapshot: &FamilySnapshot, prepared: &Prepared) -> ViewModel {
    compute_view(
        snapshot,
        prepared.root.as_deref(),
        &prepared.context,
        &prepared.layout,
    )
}

/// Returns the view model (nodes and edges) as JSON.
#[wasm_bindgen]
pub fn layout_family_tree(snapshot_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (snapshot, options) = parse_inputs(snapshot_json, options_json)?;
    let prepared = prepare(&snapshot, options);
    let view = view_for(&snapshot, &prepared);
    serde_json::to_string(&view).map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Returns a static SVG preview of the tree.
#[wasm_bindgen]
pub fn render_family_tree_svg(snapshot_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (snapshot, options) = parse_inputs(snapshot_json, options_json)?;
    let prepared = prepare(&snapshot, options);
    let view = view_for(&snapshot, &prepared);
    Ok(render_svg(
        &view,
        &prepared.theme,
        &prepared.layout,
        &RenderConfig::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "people": [
            {"id": "a", "firstName": "Anna"},
            {"id": "b", "firstName": "Boris"},
            {"id": "c", "firstName": "Clara"}
        ],
        "relationships": [
            {"id": "s1", "type": "spouse", "fromPersonId": "a", "toPersonId": "b"},
            {"id": "p1", "type": "parent_child", "fromPersonId": "a", "toPersonId": "c"}
        ]
    }"#;

    #[test]
    fn lays_out_couple_with_child() {
        let (snapshot, options) = parse_inputs(SNAPSHOT, None).unwrap();
        let prepared = prepare(&snapshot, options);
        let view = view_for(&snapshot, &prepared);
        assert_eq!(view.nodes.len(), 3);
        assert_eq!(view.edges.len(), 2);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"sourceAnchor\":\"right\""));
    }

    #[test]
    fn narrow_viewport_option_applies() {
        let options = Some(r#"{"viewportWidth": 500, "theme": "classic"}"#.to_string());
        let (snapshot, options) = parse_inputs(SNAPSHOT, options).unwrap();
        let prepared = prepare(&snapshot, options);
        assert_eq!(prepared.layout.h_spacing, 20.0);
        let svg = render_svg(
            &view_for(&snapshot, &prepared),
            &prepared.theme,
            &prepared.layout,
            &RenderConfig::default(),
        );
        assert!(svg.contains("Clara"));
    }
}
