use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub node_fill: String,
    pub node_border: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub line_color: String,
    pub spouse_line_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            node_fill: "#FFFDF5".to_string(),
            node_border: "#8B7355".to_string(),
            text_color: "#333333".to_string(),
            muted_text_color: "#6B6B6B".to_string(),
            line_color: "#888888".to_string(),
            spouse_line_color: "#B5838D".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            node_fill: "#F8FAFF".to_string(),
            node_border: "#C7D2E5".to_string(),
            text_color: "#1C2430".to_string(),
            muted_text_color: "#5B6B82".to_string(),
            line_color: "#888888".to_string(),
            spouse_line_color: "#7A8AA6".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}
