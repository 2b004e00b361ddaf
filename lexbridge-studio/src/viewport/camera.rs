//! Camera and world/screen transforms

use eframe::egui::{Pos2, Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 8.0;

/// World point shown at the center of the canvas, and the zoom factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Pos2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Pos2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Transform for a canvas occupying `rect` on screen
    pub fn transform(&self, rect: Rect) -> Transform {
        Transform {
            offset: rect.center().to_vec2() - self.center.to_vec2() * self.zoom,
            zoom: self.zoom,
        }
    }

    /// Pan by a screen-space drag delta
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.center -= screen_delta / self.zoom;
    }

    /// Multiply zoom, keeping the world point under `anchor` fixed on screen
    pub fn zoom_by(&mut self, factor: f32, anchor: Pos2, rect: Rect) {
        let before = self.transform(rect).to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let after = self.transform(rect).to_world(anchor);
        self.center += before - after;
    }

    /// Center on `bounds` and pick a zoom that fits them inside `rect`
    pub fn fit(&mut self, bounds: Rect, rect: Rect) {
        self.center = bounds.center();
        let padding = 60.0;
        let zoom_x = rect.width() / (bounds.width() + padding);
        let zoom_y = rect.height() / (bounds.height() + padding);
        let zoom = zoom_x.min(zoom_y);
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom.clamp(MIN_ZOOM, 2.0);
        }
    }
}

/// World to screen mapping for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset: Vec2,
    pub zoom: f32,
}

impl Transform {
    pub fn to_screen(&self, world: Pos2) -> Pos2 {
        Pos2::new(
            world.x * self.zoom + self.offset.x,
            world.y * self.zoom + self.offset.y,
        )
    }

    pub fn to_world(&self, screen: Pos2) -> Pos2 {
        Pos2::new(
            (screen.x - self.offset.x) / self.zoom,
            (screen.y - self.offset.y) / self.zoom,
        )
    }

    pub fn transform_rect(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(rect.min), self.to_screen(rect.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_center_maps_to_canvas_center() {
        let camera = Camera {
            center: Pos2::new(100.0, -50.0),
            zoom: 2.5,
        };
        let t = camera.transform(viewport());
        assert_eq!(t.to_screen(camera.center), Pos2::new(400.0, 300.0));

        let p = Pos2::new(13.0, 7.0);
        let back = t.to_world(t.to_screen(p));
        assert!((back - p).length() < 1e-3);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut camera = Camera::default();
        let anchor = Pos2::new(600.0, 200.0);
        let world = camera.transform(viewport()).to_world(anchor);

        camera.zoom_by(2.0, anchor, viewport());
        let again = camera.transform(viewport()).to_world(anchor);
        assert!((world - again).length() < 1e-3);
        assert_eq!(camera.zoom, 2.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.zoom_by(1000.0, Pos2::ZERO, viewport());
        assert_eq!(camera.zoom, MAX_ZOOM);
    }

    #[test]
    fn test_pan_moves_center_against_drag() {
        let mut camera = Camera {
            center: Pos2::ZERO,
            zoom: 2.0,
        };
        camera.pan_by(Vec2::new(20.0, 0.0));
        assert_eq!(camera.center, Pos2::new(-10.0, 0.0));
    }
}
