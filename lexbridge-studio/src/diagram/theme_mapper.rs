//! Graph palette derived from the application theme

use crate::theme::Theme;
use eframe::egui::Color32;

/// Colors the graph renderer needs beyond per-type node colors
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphPalette {
    /// Background color for the canvas
    pub canvas_bg: Color32,

    /// Ordinary relationship edges
    pub edge_color: Color32,

    /// Cross-regime equivalence edges
    pub equivalence_edge: Color32,

    /// Edge label text and its backing box
    pub edge_text: Color32,
    pub edge_label_bg: Color32,

    /// Fill for the hovered node
    pub hover_highlight: Color32,

    /// Node label text and the outline behind it
    pub label_text: Color32,
    pub label_outline: Color32,

    pub tooltip_bg: Color32,
    pub tooltip_text: Color32,
    pub tooltip_border: Color32,
}

impl Default for GraphPalette {
    fn default() -> Self {
        Self::from_theme(&Theme::dark())
    }
}

impl GraphPalette {
    pub fn from_theme(theme: &Theme) -> Self {
        let is_dark = !theme.is_light();
        let canvas_bg = if is_dark {
            darken(theme.bg, 0.1)
        } else {
            lighten(theme.bg, 0.02)
        };

        Self {
            canvas_bg,
            edge_color: apply_opacity(theme.fg_dim, 0.6),
            equivalence_edge: Color32::from_rgb(168, 85, 247), // violet
            edge_text: theme.fg,
            edge_label_bg: apply_opacity(canvas_bg, 0.85),
            hover_highlight: if is_dark {
                Color32::from_rgb(250, 204, 21) // yellow
            } else {
                Color32::from_rgb(202, 138, 4)
            },
            label_text: theme.fg_bright,
            label_outline: canvas_bg,
            tooltip_bg: if is_dark {
                lighten(theme.panel_bg, 0.05)
            } else {
                theme.panel_bg
            },
            tooltip_text: theme.fg,
            tooltip_border: theme.border,
        }
    }
}

/// Darken a color by a factor (0.0 - 1.0)
pub fn darken(color: Color32, factor: f32) -> Color32 {
    let factor = (1.0 - factor).max(0.0);
    Color32::from_rgb(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
    )
}

/// Lighten a color by a factor (0.0 - 1.0)
pub fn lighten(color: Color32, factor: f32) -> Color32 {
    Color32::from_rgb(
        (color.r() as f32 + (255.0 - color.r() as f32) * factor) as u8,
        (color.g() as f32 + (255.0 - color.g() as f32) * factor) as u8,
        (color.b() as f32 + (255.0 - color.b() as f32) * factor) as u8,
    )
}

/// Scale a color's alpha by `opacity`
pub fn apply_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity).round() as u8,
    )
}
