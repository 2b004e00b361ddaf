//! Interactive graph widget
//!
//! Owns the camera, layout and focus animation for the graph canvas. Shared
//! state (snapshot, hover, regime) lives in the `ViewportStore`.

use super::canvas::EguiCanvas;
use super::graph::GraphSnapshot;
use super::layout::{ForceLayout, LayoutConfig};
use super::renderer::{node_at, FrameInput, FrameStats, GraphRenderer};
use crate::viewport::{Camera, FocusController, FocusTimings, ViewportStore};
use eframe::egui::{self, Align2, FontId, Pos2, Rect, Sense};
use std::sync::Arc;

/// What the user did on the canvas this frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphViewResponse {
    /// Id of a node that was clicked
    pub clicked: Option<String>,
    /// Background was clicked
    pub clicked_empty: bool,
}

pub struct GraphView {
    pub camera: Camera,
    pub layout: ForceLayout,
    pub focus: FocusController,
    pub renderer: GraphRenderer,
    pub show_stats: bool,

    /// Snapshot the layout was seeded from
    laid_out: Option<Arc<GraphSnapshot>>,
    dragging_node: Option<String>,
    fit_pending: bool,
    last_stats: FrameStats,
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(GraphRenderer::default(), FocusTimings::default())
    }
}

impl GraphView {
    pub fn new(renderer: GraphRenderer, timings: FocusTimings) -> Self {
        Self {
            camera: Camera::default(),
            layout: ForceLayout::new(LayoutConfig::default()),
            focus: FocusController::new(timings),
            renderer,
            show_stats: true,
            laid_out: None,
            dragging_node: None,
            fit_pending: false,
            last_stats: FrameStats::default(),
        }
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Animate toward the node for a citation uuid or node id
    pub fn focus_on(&mut self, key: &str, snapshot: &GraphSnapshot) -> bool {
        self.focus
            .request_focus(key, snapshot, &self.layout, &self.camera)
    }

    /// Fit the whole graph on the next frame
    pub fn fit_to_view(&mut self) {
        self.focus.cancel();
        self.fit_pending = true;
    }

    /// Manual camera input wins over focus animation and auto-fit
    fn stop_auto_camera(&mut self) {
        self.focus.cancel();
        self.fit_pending = false;
    }

    fn sync_snapshot(&mut self, snapshot: &Arc<GraphSnapshot>) {
        let current = self
            .laid_out
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, snapshot));
        if !current {
            self.layout.reset_for(snapshot);
            self.focus.cancel();
            self.dragging_node = None;
            self.fit_pending = true;
            self.laid_out = Some(Arc::clone(snapshot));
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, store: &mut ViewportStore) -> GraphViewResponse {
        let snapshot = store.snapshot();
        self.sync_snapshot(&snapshot);

        let mut animating = !self.layout.step(&snapshot);

        let available_size = ui.available_size();
        let (response, painter) = ui.allocate_painter(available_size, Sense::click_and_drag());
        let rect = response.rect;

        painter.rect_filled(rect, 0.0, self.renderer.palette.canvas_bg);

        if self.fit_pending {
            if let Some(bounds) = self.layout.bounds() {
                self.camera.fit(bounds, rect);
            }
            // Keep fitting while the layout settles
            self.fit_pending = !self.layout.is_converged();
        }

        let dt = ui.input(|i| i.stable_dt).min(0.1);
        animating |= self.focus.tick(dt, &mut self.camera);

        let result = self.handle_input(ui, &response, &snapshot, store);

        let transform = self.camera.transform(rect);
        let hovered = store.hovered().map(str::to_string);
        let frame = FrameInput {
            snapshot: &snapshot,
            positions: &self.layout,
            hovered: hovered.as_deref(),
            regime_mode: store.regime_mode(),
            zoom: self.camera.zoom,
        };
        let mut canvas = EguiCanvas::new(&painter, transform);
        self.last_stats = self.renderer.render_frame(&mut canvas, &frame);

        if snapshot.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Ask a question to see its knowledge graph",
                FontId::proportional(14.0),
                self.renderer.palette.edge_text,
            );
        } else if self.show_stats {
            self.draw_stats(&painter, rect, &snapshot);
        }

        if animating {
            ui.ctx().request_repaint();
        }
        result
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        snapshot: &GraphSnapshot,
        store: &mut ViewportStore,
    ) -> GraphViewResponse {
        let mut result = GraphViewResponse::default();
        let rect = response.rect;

        // Zoom with scroll wheel around the pointer
        if response.hovered() {
            let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll_delta != 0.0 {
                self.stop_auto_camera();
                let anchor = response.hover_pos().unwrap_or(rect.center());
                self.camera.zoom_by(1.0 + scroll_delta * 0.001, anchor, rect);
            }
        }

        // Pan with middle or right mouse
        if response.dragged_by(egui::PointerButton::Middle)
            || response.dragged_by(egui::PointerButton::Secondary)
        {
            self.stop_auto_camera();
            self.camera.pan_by(response.drag_delta());
        }

        let transform = self.camera.transform(rect);
        let pointer_world = response
            .interact_pointer_pos()
            .or_else(|| response.hover_pos())
            .map(|p| transform.to_world(p));
        let hit = pointer_world
            .and_then(|world| node_at(snapshot, &self.layout, world, self.camera.zoom))
            .map(|node| node.id.clone());

        if self.dragging_node.is_none() {
            store.set_hovered(hit.clone());
        }

        // Drag nodes with primary mouse, pan when dragging the background
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging_node = hit.clone();
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(id) = self.dragging_node.clone() {
                if let Some(world) = pointer_world {
                    self.layout.set_position(&id, world);
                }
            } else {
                self.stop_auto_camera();
                self.camera.pan_by(response.drag_delta());
            }
        }
        if response.drag_stopped() {
            self.dragging_node = None;
        }

        if response.clicked() {
            match hit {
                Some(id) => result.clicked = Some(id),
                None => result.clicked_empty = true,
            }
        }

        if response.has_focus() || response.hovered() {
            if ui.input(|i| i.key_pressed(egui::Key::F)) {
                self.fit_to_view();
            }
        }

        result
    }

    fn draw_stats(&self, painter: &egui::Painter, rect: Rect, snapshot: &GraphSnapshot) {
        let mut text = format!(
            "{} nodes · {} edges · {} cited · {:.0}%",
            snapshot.nodes().len(),
            snapshot.edges().len(),
            snapshot.cited_count(),
            self.camera.zoom * 100.0
        );
        if snapshot.dropped_edges > 0 {
            text.push_str(&format!(" · {} dropped", snapshot.dropped_edges));
        }
        if self.last_stats.nodes_skipped > 0 {
            text.push_str(&format!(" · {} unplaced", self.last_stats.nodes_skipped));
        }
        painter.text(
            Pos2::new(rect.left() + 8.0, rect.bottom() - 8.0),
            Align2::LEFT_BOTTOM,
            text,
            FontId::proportional(11.0),
            self.renderer.palette.edge_text,
        );
    }
}
