//! Drawing surfaces for the graph renderer
//!
//! The renderer draws in world coordinates. `EguiCanvas` maps them to screen
//! space with the camera transform; `RecordingCanvas` keeps every call so a
//! frame can be inspected without a window.

use crate::viewport::camera::Transform;
use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2};

/// Minimal 2D surface the renderer needs
pub trait Canvas {
    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32);
    fn circle_stroke(&mut self, center: Pos2, radius: f32, stroke: Stroke);
    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke);
    fn dashed_line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, dash: f32, gap: f32);
    fn rect_filled(&mut self, rect: Rect, rounding: f32, color: Color32);
    fn rect_stroke(&mut self, rect: Rect, rounding: f32, stroke: Stroke);

    /// Size of `text` in world units
    fn measure_text(&self, text: &str, size: f32, bold: bool) -> Vec2;

    /// Outline drawn behind subsequent text until cleared
    fn set_text_outline(&mut self, outline: Option<Stroke>);
    fn text_outline(&self) -> Option<Stroke>;

    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, size: f32, bold: bool, color: Color32);
}

// ═══════════════════════════════════════════════════════════════════════════
// egui
// ═══════════════════════════════════════════════════════════════════════════

/// Canvas backed by an egui painter
pub struct EguiCanvas<'p> {
    painter: &'p Painter,
    transform: Transform,
    outline: Option<Stroke>,
}

impl<'p> EguiCanvas<'p> {
    pub fn new(painter: &'p Painter, transform: Transform) -> Self {
        Self {
            painter,
            transform,
            outline: None,
        }
    }

    fn font(&self, size: f32) -> FontId {
        FontId::proportional((size * self.transform.zoom).max(1.0))
    }

    fn screen_stroke(&self, stroke: Stroke) -> Stroke {
        Stroke::new(stroke.width * self.transform.zoom, stroke.color)
    }

    fn draw_text_at(&self, pos: Pos2, anchor: Align2, text: &str, font: FontId, bold: bool, color: Color32) {
        self.painter.text(pos, anchor, text, font.clone(), color);
        if bold {
            // Default fonts have no bold face; overdraw with a small offset
            self.painter.text(pos + Vec2::new(0.6, 0.0), anchor, text, font, color);
        }
    }
}

impl Canvas for EguiCanvas<'_> {
    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.painter.circle_filled(
            self.transform.to_screen(center),
            radius * self.transform.zoom,
            color,
        );
    }

    fn circle_stroke(&mut self, center: Pos2, radius: f32, stroke: Stroke) {
        self.painter.circle_stroke(
            self.transform.to_screen(center),
            radius * self.transform.zoom,
            self.screen_stroke(stroke),
        );
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.painter.line_segment(
            [self.transform.to_screen(from), self.transform.to_screen(to)],
            self.screen_stroke(stroke),
        );
    }

    fn dashed_line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, dash: f32, gap: f32) {
        let zoom = self.transform.zoom;
        let points = [self.transform.to_screen(from), self.transform.to_screen(to)];
        self.painter.extend(egui::Shape::dashed_line(
            &points,
            self.screen_stroke(stroke),
            dash * zoom,
            gap * zoom,
        ));
    }

    fn rect_filled(&mut self, rect: Rect, rounding: f32, color: Color32) {
        self.painter.rect_filled(
            self.transform.transform_rect(rect),
            rounding * self.transform.zoom,
            color,
        );
    }

    fn rect_stroke(&mut self, rect: Rect, rounding: f32, stroke: Stroke) {
        self.painter.rect_stroke(
            self.transform.transform_rect(rect),
            rounding * self.transform.zoom,
            self.screen_stroke(stroke),
        );
    }

    fn measure_text(&self, text: &str, size: f32, bold: bool) -> Vec2 {
        let galley = self
            .painter
            .layout_no_wrap(text.to_string(), self.font(size), Color32::WHITE);
        let extra = if bold { 0.6 } else { 0.0 };
        (galley.size() + Vec2::new(extra, 0.0)) / self.transform.zoom
    }

    fn set_text_outline(&mut self, outline: Option<Stroke>) {
        self.outline = outline;
    }

    fn text_outline(&self) -> Option<Stroke> {
        self.outline
    }

    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, size: f32, bold: bool, color: Color32) {
        let screen = self.transform.to_screen(pos);
        let font = self.font(size);

        if let Some(outline) = self.outline {
            let w = (outline.width * self.transform.zoom * 0.5).max(0.5);
            for offset in [
                Vec2::new(-w, 0.0),
                Vec2::new(w, 0.0),
                Vec2::new(0.0, -w),
                Vec2::new(0.0, w),
                Vec2::new(-w, -w),
                Vec2::new(w, -w),
                Vec2::new(-w, w),
                Vec2::new(w, w),
            ] {
                self.draw_text_at(screen + offset, anchor, text, font.clone(), bold, outline.color);
            }
        }

        self.draw_text_at(screen, anchor, text, font, bold, color);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Recording
// ═══════════════════════════════════════════════════════════════════════════

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Circle {
        center: Pos2,
        radius: f32,
        color: Color32,
    },
    Ring {
        center: Pos2,
        radius: f32,
        stroke: Stroke,
    },
    Line {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
        dashed: bool,
    },
    Rect {
        rect: Rect,
        color: Color32,
    },
    RectStroke {
        rect: Rect,
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        text: String,
        size: f32,
        bold: bool,
        color: Color32,
        outline: Option<Stroke>,
    },
}

/// Canvas that records draw calls. Text is measured with a fixed advance of
/// 0.6 × size per character.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub ops: Vec<DrawOp>,
    outline: Option<Stroke>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded text calls
    pub fn texts(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Text { .. }))
    }

    /// The filled circle drawn at `center`, if any
    pub fn circle_at(&self, center: Pos2) -> Option<(f32, Color32)> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Circle {
                center: c,
                radius,
                color,
            } if *c == center => Some((*radius, *color)),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.ops.push(DrawOp::Circle { center, radius, color });
    }

    fn circle_stroke(&mut self, center: Pos2, radius: f32, stroke: Stroke) {
        self.ops.push(DrawOp::Ring { center, radius, stroke });
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            stroke,
            dashed: false,
        });
    }

    fn dashed_line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, _dash: f32, _gap: f32) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            stroke,
            dashed: true,
        });
    }

    fn rect_filled(&mut self, rect: Rect, _rounding: f32, color: Color32) {
        self.ops.push(DrawOp::Rect { rect, color });
    }

    fn rect_stroke(&mut self, rect: Rect, _rounding: f32, stroke: Stroke) {
        self.ops.push(DrawOp::RectStroke { rect, stroke });
    }

    fn measure_text(&self, text: &str, size: f32, _bold: bool) -> Vec2 {
        Vec2::new(text.chars().count() as f32 * size * 0.6, size)
    }

    fn set_text_outline(&mut self, outline: Option<Stroke>) {
        self.outline = outline;
    }

    fn text_outline(&self) -> Option<Stroke> {
        self.outline
    }

    fn text(&mut self, pos: Pos2, _anchor: Align2, text: &str, size: f32, bold: bool, color: Color32) {
        self.ops.push(DrawOp::Text {
            pos,
            text: text.to_string(),
            size,
            bold,
            color,
            outline: self.outline,
        });
    }
}
