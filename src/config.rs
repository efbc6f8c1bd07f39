use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry shared by the hierarchy layout and the unconnected grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    /// Height used for view nodes without a persisted size.
    pub node_height: f32,
    pub h_spacing: f32,
    /// Vertical distance between generations.
    pub v_spacing: f32,
    /// Horizontal clearance between independent trees.
    pub forest_gap: f32,
    /// Row width at which the unconnected grid wraps.
    pub grid_width: f32,
    pub compact_breakpoint: f32,
    pub compact_h_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 100.0,
            h_spacing: 50.0,
            v_spacing: 350.0,
            forest_gap: 200.0,
            grid_width: 1024.0,
            compact_breakpoint: 768.0,
            compact_h_spacing: 20.0,
        }
    }
}

impl LayoutConfig {
    /// Adapts spacing and grid wrapping to the width of the viewing surface.
    pub fn for_viewport(mut self, width: f32) -> Self {
        self.grid_width = width;
        if width < self.compact_breakpoint {
            self.h_spacing = self.compact_h_spacing;
            self.forest_gap = self.compact_h_spacing * 4.0;
        }
        self
    }

    /// Width of a node together with a spouse drawn beside it.
    pub fn couple_width(&self) -> f32 {
        2.0 * self.node_width + self.h_spacing
    }
}

/// Which person details the renderer should show on each card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplaySettings {
    pub show_birth_date: bool,
    pub show_death_date: bool,
    pub show_birth_place: bool,
    pub show_occupation: bool,
    pub show_photos: bool,
    pub show_current_place: bool,
    pub show_father_name: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_birth_date: true,
            show_death_date: true,
            show_birth_place: false,
            show_occupation: false,
            show_photos: true,
            show_current_place: false,
            show_father_name: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub display: DisplaySettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    node_fill: Option<String>,
    node_border: Option<String>,
    text_color: Option<String>,
    muted_text_color: Option<String>,
    line_color: Option<String>,
    spouse_line_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    h_spacing: Option<f32>,
    v_spacing: Option<f32>,
    forest_gap: Option<f32>,
    grid_width: Option<f32>,
    compact_breakpoint: Option<f32>,
    compact_h_spacing: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisplaySettingsFile {
    show_birth_date: Option<bool>,
    show_death_date: Option<bool>,
    show_birth_place: Option<bool>,
    show_occupation: Option<bool>,
    show_photos: Option<bool>,
    show_current_place: Option<bool>,
    show_father_name: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    display: Option<DisplaySettingsFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON5 config document and merges it over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => log::warn!("unknown theme `{other}`, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_border {
            config.theme.node_border = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.muted_text_color {
            config.theme.muted_text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.spouse_line_color {
            config.theme.spouse_line_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.node_width {
            target.node_width = v.max(1.0);
        }
        if let Some(v) = layout.node_height {
            target.node_height = v.max(1.0);
        }
        if let Some(v) = layout.h_spacing {
            target.h_spacing = v.max(0.0);
        }
        if let Some(v) = layout.v_spacing {
            target.v_spacing = v.max(0.0);
        }
        if let Some(v) = layout.forest_gap {
            target.forest_gap = v.max(0.0);
        }
        if let Some(v) = layout.grid_width {
            target.grid_width = v;
        }
        if let Some(v) = layout.compact_breakpoint {
            target.compact_breakpoint = v;
        }
        if let Some(v) = layout.compact_h_spacing {
            target.compact_h_spacing = v.max(0.0);
        }
    }

    if let Some(display) = parsed.display {
        let target = &mut config.display;
        if let Some(v) = display.show_birth_date {
            target.show_birth_date = v;
        }
        if let Some(v) = display.show_death_date {
            target.show_death_date = v;
        }
        if let Some(v) = display.show_birth_place {
            target.show_birth_place = v;
        }
        if let Some(v) = display.show_occupation {
            target.show_occupation = v;
        }
        if let Some(v) = display.show_photos {
            target.show_photos = v;
        }
        if let Some(v) = display.show_current_place {
            target.show_current_place = v;
        }
        if let Some(v) = display.show_father_name {
            target.show_father_name = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_partial_overrides() {
        let config = parse_config(
            r##"{
                // comments are fine in JSON5
                theme: "classic",
                themeVariables: { lineColor: "#123456" },
                layout: { hSpacing: 30, vSpacing: 200 },
                display: { showOccupation: true },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.line_color, "#123456");
        assert_eq!(config.theme.node_fill, Theme::classic().node_fill);
        assert_eq!(config.layout.h_spacing, 30.0);
        assert_eq!(config.layout.v_spacing, 200.0);
        assert_eq!(config.layout.node_width, 200.0);
        assert!(config.display.show_occupation);
        assert!(config.display.show_birth_date);
    }

    #[test]
    fn narrow_viewport_tightens_spacing() {
        let narrow = LayoutConfig::default().for_viewport(600.0);
        assert_eq!(narrow.h_spacing, 20.0);
        assert_eq!(narrow.grid_width, 600.0);

        let wide = LayoutConfig::default().for_viewport(1440.0);
        assert_eq!(wide.h_spacing, 50.0);
        assert_eq!(wide.couple_width(), 450.0);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.v_spacing, 350.0);
    }
}
