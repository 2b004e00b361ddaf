//! Application color themes

use eframe::egui::{self, Color32};

/// Dark+ inspired palette shared by the panels and the graph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub bg: Color32,
    pub panel_bg: Color32,
    pub statusbar_bg: Color32,
    pub input_bg: Color32,
    pub code_bg: Color32,

    pub fg: Color32,
    pub fg_dim: Color32,
    pub fg_bright: Color32,

    pub accent: Color32,
    pub accent_dim: Color32,
    /// Inline citation links in answers and drafts
    pub link: Color32,

    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    pub border: Color32,
    pub selection: Color32,
    pub list_hover: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg: Color32::from_rgb(30, 30, 30),          // #1e1e1e
            panel_bg: Color32::from_rgb(37, 37, 38),    // #252526
            statusbar_bg: Color32::from_rgb(0, 122, 204), // #007acc
            input_bg: Color32::from_rgb(60, 60, 60),    // #3c3c3c
            code_bg: Color32::from_rgb(26, 26, 26),     // #1a1a1a

            fg: Color32::from_rgb(204, 204, 204),       // #cccccc
            fg_dim: Color32::from_rgb(128, 128, 128),   // #808080
            fg_bright: Color32::from_rgb(255, 255, 255),

            accent: Color32::from_rgb(0, 120, 212),     // #0078d4
            accent_dim: Color32::from_rgb(38, 79, 120), // #264f78
            link: Color32::from_rgb(96, 165, 250),      // #60a5fa

            success: Color32::from_rgb(63, 185, 80),    // #3fb950
            warning: Color32::from_rgb(204, 167, 0),    // #cca700
            error: Color32::from_rgb(248, 81, 73),      // #f85149

            border: Color32::from_rgb(60, 60, 60),
            selection: Color32::from_rgb(38, 79, 120),
            list_hover: Color32::from_rgb(42, 45, 46),
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color32::from_rgb(255, 255, 255),
            panel_bg: Color32::from_rgb(243, 243, 243), // #f3f3f3
            statusbar_bg: Color32::from_rgb(0, 122, 204),
            input_bg: Color32::from_rgb(255, 255, 255),
            code_bg: Color32::from_rgb(248, 248, 248),

            fg: Color32::from_rgb(51, 51, 51),
            fg_dim: Color32::from_rgb(128, 128, 128),
            fg_bright: Color32::from_rgb(0, 0, 0),

            accent: Color32::from_rgb(0, 120, 212),
            accent_dim: Color32::from_rgb(200, 220, 240),
            link: Color32::from_rgb(29, 78, 216),       // #1d4ed8

            success: Color32::from_rgb(40, 160, 40),
            warning: Color32::from_rgb(180, 130, 0),
            error: Color32::from_rgb(200, 50, 50),

            border: Color32::from_rgb(200, 200, 200),
            selection: Color32::from_rgb(173, 214, 255),
            list_hover: Color32::from_rgb(232, 232, 232),
        }
    }

    /// Look up a built-in theme by name. Unknown names fall back to dark.
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "light" => Self::light(),
            "dark" => Self::dark(),
            other => {
                log::warn!("Unknown theme '{}', using dark", other);
                Self::dark()
            }
        }
    }

    pub fn is_light(&self) -> bool {
        let brightness = (self.bg.r() as u32 + self.bg.g() as u32 + self.bg.b() as u32) / 3;
        brightness > 128
    }

    /// egui visuals for this palette
    pub fn visuals(&self) -> egui::Visuals {
        let mut visuals = if self.is_light() {
            egui::Visuals::light()
        } else {
            egui::Visuals::dark()
        };
        visuals.panel_fill = self.bg;
        visuals.window_fill = self.panel_bg;
        visuals.faint_bg_color = self.input_bg;
        visuals.extreme_bg_color = self.code_bg;
        visuals.hyperlink_color = self.link;
        visuals.widgets.noninteractive.bg_fill = self.panel_bg;
        visuals.widgets.inactive.bg_fill = self.input_bg;
        visuals.widgets.hovered.bg_fill = self.list_hover;
        visuals.widgets.active.bg_fill = self.accent;
        visuals.selection.bg_fill = self.selection;
        visuals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_detection() {
        assert!(!Theme::dark().is_light());
        assert!(Theme::light().is_light());
    }

    #[test]
    fn test_by_name_falls_back_to_dark() {
        assert_eq!(Theme::by_name("Light"), Theme::light());
        assert_eq!(Theme::by_name("solarized"), Theme::dark());
    }
}
