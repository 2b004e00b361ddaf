//! Graph render engine
//!
//! Paints one frame of the current snapshot onto a `Canvas`:
//! - Regime dimming and hover highlight
//! - Size by importance (law, cited, other) with a halo on cited nodes
//! - Outlined labels that keep a constant on-screen size
//! - Dashed equivalence edges and zoom-gated edge labels
//! - Tooltip box for the hovered node, drawn last
//!
//! All sizes are in world units; the canvas applies the camera transform.

use super::canvas::Canvas;
use super::classify::{color_for, matches_regime};
use super::graph::{GraphEdge, GraphNode, GraphSnapshot};
use super::layout::PositionSource;
use super::theme_mapper::{apply_opacity, GraphPalette};
use crate::error::RenderError;
use crate::viewport::RegimeMode;
use eframe::egui::{Align2, Color32, Pos2, Rect, Stroke, Vec2};

pub const DIM_OPACITY: f32 = 0.1;

pub const LAW_RADIUS: f32 = 12.0;
pub const CITED_RADIUS: f32 = 9.0;
pub const NODE_RADIUS: f32 = 6.0;

/// On-screen label size in points
pub const LABEL_FONT_SIZE: f32 = 12.0;
pub const EDGE_LABEL_FONT_SIZE: f32 = 10.0;
pub const EDGE_LABEL_MIN_ZOOM: f32 = 1.5;

pub const EDGE_WIDTH: f32 = 1.0;
pub const EQUIVALENCE_EDGE_WIDTH: f32 = 2.0;

const EDGE_LABEL_PADDING: f32 = 2.0;
const DASH_LENGTH: f32 = 5.0;
const DASH_GAP: f32 = 5.0;
const HALO_GAP: f32 = 3.0;
const HALO_OPACITY: f32 = 0.3;
const LABEL_GAP: f32 = 2.0;
const LABEL_OUTLINE_WIDTH: f32 = 3.0;
const TOOLTIP_FONT_SIZE: f32 = 12.0;
const TOOLTIP_LINE_HEIGHT: f32 = 16.0;
const TOOLTIP_PADDING: f32 = 8.0;
const TOOLTIP_OFFSET: f32 = 6.0;
const HIT_SLACK: f32 = 2.0;

/// Tunables read from config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub dim_opacity: f32,
    pub edge_label_min_zoom: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dim_opacity: DIM_OPACITY,
            edge_label_min_zoom: EDGE_LABEL_MIN_ZOOM,
        }
    }
}

/// Everything one frame reads
pub struct FrameInput<'a> {
    pub snapshot: &'a GraphSnapshot,
    pub positions: &'a dyn PositionSource,
    pub hovered: Option<&'a str>,
    pub regime_mode: RegimeMode,
    pub zoom: f32,
}

/// What a frame actually drew
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes_drawn: usize,
    pub nodes_skipped: usize,
    pub edges_drawn: usize,
    pub edges_skipped: usize,
    pub edge_labels_drawn: usize,
    pub tooltip_drawn: bool,
}

/// Opacity of a node under the regime filter. Total; the hovered node is
/// always fully opaque.
pub fn node_opacity(node: &GraphNode, mode: RegimeMode, hovered: bool, dim_opacity: f32) -> f32 {
    if hovered {
        return 1.0;
    }
    match mode.dimmed_regime() {
        Some(dimmed) if matches_regime(&node.label, dimmed) => dim_opacity,
        _ => 1.0,
    }
}

pub fn node_radius(node: &GraphNode) -> f32 {
    if node.is_law() {
        LAW_RADIUS
    } else if node.is_cited {
        CITED_RADIUS
    } else {
        NODE_RADIUS
    }
}

/// Label font size in world units for a constant on-screen size
pub fn label_font_size(zoom: f32) -> f32 {
    LABEL_FONT_SIZE / zoom.max(f32::EPSILON)
}

fn checked_position(positions: &dyn PositionSource, id: &str) -> Result<Pos2, RenderError> {
    let pos = positions
        .position(id)
        .ok_or_else(|| RenderError::NoPosition(id.to_string()))?;
    if pos.x.is_finite() && pos.y.is_finite() {
        Ok(pos)
    } else {
        Err(RenderError::NonFinitePosition {
            id: id.to_string(),
            x: pos.x,
            y: pos.y,
        })
    }
}

/// Topmost node whose disc contains `world`
pub fn node_at<'a>(
    snapshot: &'a GraphSnapshot,
    positions: &dyn PositionSource,
    world: Pos2,
    zoom: f32,
) -> Option<&'a GraphNode> {
    let slack = HIT_SLACK / zoom.max(f32::EPSILON);
    snapshot.nodes().iter().rev().find(|node| {
        checked_position(positions, &node.id)
            .map(|pos| pos.distance(world) <= node_radius(node) + slack)
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Default)]
pub struct GraphRenderer {
    pub palette: GraphPalette,
    pub settings: RenderSettings,
}

impl GraphRenderer {
    pub fn new(palette: GraphPalette, settings: RenderSettings) -> Self {
        Self { palette, settings }
    }

    /// Draw edges, then nodes, then the tooltip. Nodes that cannot be drawn
    /// are logged and skipped; the frame always completes.
    pub fn render_frame(&self, canvas: &mut dyn Canvas, frame: &FrameInput) -> FrameStats {
        let mut stats = FrameStats::default();
        let zoom = frame.zoom.max(f32::EPSILON);

        for edge in frame.snapshot.edges() {
            match self.draw_edge(canvas, edge, frame.positions, zoom) {
                Some(labelled) => {
                    stats.edges_drawn += 1;
                    if labelled {
                        stats.edge_labels_drawn += 1;
                    }
                }
                None => stats.edges_skipped += 1,
            }
        }

        for node in frame.snapshot.nodes() {
            let hovered = frame.hovered == Some(node.id.as_str());
            match self.draw_node(canvas, node, frame, hovered, zoom) {
                Ok(()) => stats.nodes_drawn += 1,
                Err(e) => {
                    log::debug!("Skipping node: {}", e);
                    stats.nodes_skipped += 1;
                }
            }
        }

        if let Some(node) = frame.hovered.and_then(|id| frame.snapshot.get(id)) {
            if let (Some(text), Ok(pos)) = (
                node.tooltip.as_deref(),
                checked_position(frame.positions, &node.id),
            ) {
                stats.tooltip_drawn = self.draw_tooltip(canvas, pos, node_radius(node), text, zoom);
            }
        }

        stats
    }

    /// Returns None if an endpoint has no usable position, otherwise whether
    /// a label was drawn
    fn draw_edge(
        &self,
        canvas: &mut dyn Canvas,
        edge: &GraphEdge,
        positions: &dyn PositionSource,
        zoom: f32,
    ) -> Option<bool> {
        let from = checked_position(positions, &edge.source).ok()?;
        let to = checked_position(positions, &edge.target).ok()?;

        if edge.relation.is_equivalence() {
            let stroke = Stroke::new(EQUIVALENCE_EDGE_WIDTH / zoom, self.palette.equivalence_edge);
            canvas.dashed_line(from, to, stroke, DASH_LENGTH / zoom, DASH_GAP / zoom);
        } else {
            canvas.line(from, to, Stroke::new(EDGE_WIDTH / zoom, self.palette.edge_color));
        }

        let Some(label) = edge.label.as_deref().filter(|l| !l.is_empty()) else {
            return Some(false);
        };
        if zoom < self.settings.edge_label_min_zoom {
            return Some(false);
        }

        let size = EDGE_LABEL_FONT_SIZE / zoom;
        let mid = from.lerp(to, 0.5);
        let text_size = canvas.measure_text(label, size, false);
        let bg = Rect::from_center_size(mid, text_size + Vec2::splat(2.0 * EDGE_LABEL_PADDING / zoom));
        canvas.rect_filled(bg, 2.0 / zoom, self.palette.edge_label_bg);
        canvas.text(mid, Align2::CENTER_CENTER, label, size, false, self.palette.edge_text);
        Some(true)
    }

    fn draw_node(
        &self,
        canvas: &mut dyn Canvas,
        node: &GraphNode,
        frame: &FrameInput,
        hovered: bool,
        zoom: f32,
    ) -> Result<(), RenderError> {
        let pos = checked_position(frame.positions, &node.id)?;
        let opacity = node_opacity(node, frame.regime_mode, hovered, self.settings.dim_opacity);
        let radius = node_radius(node);
        let base = color_for(node.entity_type);

        if node.is_cited {
            let halo = apply_opacity(base, HALO_OPACITY * opacity);
            canvas.circle_stroke(pos, radius + HALO_GAP / zoom, Stroke::new(2.0 / zoom, halo));
        }

        let fill = node_fill(&self.palette, node, hovered);
        canvas.circle_filled(pos, radius, apply_opacity(fill, opacity));

        let size = label_font_size(zoom);
        let outline = apply_opacity(self.palette.label_outline, opacity);
        canvas.set_text_outline(Some(Stroke::new(LABEL_OUTLINE_WIDTH / zoom, outline)));
        canvas.text(
            pos + Vec2::new(0.0, radius + LABEL_GAP / zoom),
            Align2::CENTER_TOP,
            &node.label,
            size,
            node.is_law(),
            apply_opacity(self.palette.label_text, opacity),
        );
        canvas.set_text_outline(None);

        Ok(())
    }

    /// Returns false when the text has nothing to show
    fn draw_tooltip(&self, canvas: &mut dyn Canvas, pos: Pos2, radius: f32, text: &str, zoom: f32) -> bool {
        let lines: Vec<String> = text.lines().map(|l| l.replace("**", "")).collect();
        if lines.iter().all(|l| l.trim().is_empty()) {
            return false;
        }

        let size = TOOLTIP_FONT_SIZE / zoom;
        let line_height = TOOLTIP_LINE_HEIGHT / zoom;
        let padding = TOOLTIP_PADDING / zoom;
        let widest = lines
            .iter()
            .map(|l| canvas.measure_text(l, size, false).x)
            .fold(0.0f32, f32::max);

        let box_size = Vec2::new(
            widest + 2.0 * padding,
            lines.len() as f32 * line_height + 2.0 * padding,
        );
        let bottom = pos.y - radius - TOOLTIP_OFFSET / zoom;
        let rect = Rect::from_min_size(
            Pos2::new(pos.x - box_size.x / 2.0, bottom - box_size.y),
            box_size,
        );

        canvas.rect_filled(rect, 4.0 / zoom, self.palette.tooltip_bg);
        canvas.rect_stroke(rect, 4.0 / zoom, Stroke::new(1.0 / zoom, self.palette.tooltip_border));

        for (i, line) in lines.iter().enumerate() {
            canvas.text(
                rect.min + Vec2::new(padding, padding + i as f32 * line_height),
                Align2::LEFT_TOP,
                line,
                size,
                false,
                self.palette.tooltip_text,
            );
        }
        true
    }
}

/// Color used to paint a node's fill, before opacity
pub fn node_fill(palette: &GraphPalette, node: &GraphNode, hovered: bool) -> Color32 {
    if hovered {
        palette.hover_highlight
    } else {
        color_for(node.entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::canvas::{DrawOp, RecordingCanvas};
    use crate::diagram::classify::EntityType;
    use crate::diagram::graph::{build, GraphPayload, NodeMetadata, RawEdge, RawNode};
    use std::collections::HashMap;

    fn node(id: &str, label: &str) -> RawNode {
        RawNode {
            id: Some(id.into()),
            label: Some(label.into()),
            ..Default::default()
        }
    }

    fn edge(source: &str, target: &str, relation: &str, label: Option<&str>) -> RawEdge {
        RawEdge {
            source: Some(source.into()),
            target: Some(target.into()),
            relation: Some(relation.into()),
            label: label.map(String::from),
        }
    }

    fn bridge_graph() -> (GraphSnapshot, HashMap<String, Pos2>) {
        let mut cited = node("murder", "Murder");
        cited.metadata = Some(NodeMetadata {
            tooltip: Some("**Murder**\nCited in answer".into()),
            is_cited: Some(true),
            relationship_count: Some(2),
        });
        let payload = GraphPayload {
            nodes: vec![
                node("ipc_302", "Section 302 IPC"),
                node("bns_103", "Section 103 BNS"),
                cited,
                node("art_21", "Article 21"),
            ],
            edges: vec![
                edge("ipc_302", "bns_103", "EQUIVALENT_TO", Some("EQUIVALENT_TO")),
                edge("ipc_302", "murder", "DEFINES", Some("DEFINES")),
            ],
            stats: None,
        };
        let positions = HashMap::from([
            ("ipc_302".to_string(), Pos2::new(0.0, 0.0)),
            ("bns_103".to_string(), Pos2::new(100.0, 0.0)),
            ("murder".to_string(), Pos2::new(0.0, 100.0)),
            ("art_21".to_string(), Pos2::new(-100.0, 0.0)),
        ]);
        (build(&payload).unwrap(), positions)
    }

    fn render(
        snapshot: &GraphSnapshot,
        positions: &HashMap<String, Pos2>,
        hovered: Option<&str>,
        mode: RegimeMode,
        zoom: f32,
    ) -> (RecordingCanvas, FrameStats) {
        let mut canvas = RecordingCanvas::new();
        let frame = FrameInput {
            snapshot,
            positions,
            hovered,
            regime_mode: mode,
            zoom,
        };
        let stats = GraphRenderer::default().render_frame(&mut canvas, &frame);
        (canvas, stats)
    }

    #[test]
    fn test_legacy_mode_dims_current_nodes() {
        let (snap, _) = bridge_graph();
        for node in snap.nodes() {
            let opacity = node_opacity(node, RegimeMode::Legacy, false, DIM_OPACITY);
            if node.id == "bns_103" {
                assert!(opacity <= 0.15);
            } else {
                assert_eq!(opacity, 1.0, "{}", node.id);
            }
        }
    }

    #[test]
    fn test_two_regime_label_dims_in_both_filter_modes() {
        let snap = build(&GraphPayload {
            nodes: vec![node("bridge", "Section 302 IPC / Section 103 BNS")],
            ..Default::default()
        })
        .unwrap();
        let bridge = snap.get("bridge").unwrap();

        for mode in [RegimeMode::Legacy, RegimeMode::Current] {
            assert_eq!(node_opacity(bridge, mode, false, DIM_OPACITY), DIM_OPACITY, "{:?}", mode);
        }
        assert_eq!(node_opacity(bridge, RegimeMode::Compare, false, DIM_OPACITY), 1.0);
        assert_eq!(node_opacity(bridge, RegimeMode::Legacy, true, DIM_OPACITY), 1.0);
    }

    #[test]
    fn test_current_mode_dims_legacy_nodes() {
        let (snap, _) = bridge_graph();
        let ipc = snap.get("ipc_302").unwrap();
        let bns = snap.get("bns_103").unwrap();
        assert_eq!(node_opacity(ipc, RegimeMode::Current, false, DIM_OPACITY), DIM_OPACITY);
        assert_eq!(node_opacity(bns, RegimeMode::Current, false, DIM_OPACITY), 1.0);
        assert_eq!(node_opacity(ipc, RegimeMode::Compare, false, DIM_OPACITY), 1.0);
    }

    #[test]
    fn test_hover_overrides_dimming() {
        let (snap, positions) = bridge_graph();
        let bns = snap.get("bns_103").unwrap();
        assert_eq!(node_opacity(bns, RegimeMode::Legacy, true, DIM_OPACITY), 1.0);

        let (canvas, _) = render(&snap, &positions, Some("bns_103"), RegimeMode::Legacy, 1.0);
        let (_, color) = canvas.circle_at(Pos2::new(100.0, 0.0)).unwrap();
        assert_eq!(color, GraphPalette::default().hover_highlight);
    }

    #[test]
    fn test_sizes_and_halo() {
        let (snap, positions) = bridge_graph();
        let (canvas, stats) = render(&snap, &positions, None, RegimeMode::Compare, 1.0);
        assert_eq!(stats.nodes_drawn, 4);

        // Section 302 IPC classifies as a law
        assert_eq!(canvas.circle_at(Pos2::new(0.0, 0.0)).unwrap().0, LAW_RADIUS);
        assert_eq!(canvas.circle_at(Pos2::new(0.0, 100.0)).unwrap().0, CITED_RADIUS);
        assert_eq!(canvas.circle_at(Pos2::new(-100.0, 0.0)).unwrap().0, NODE_RADIUS);

        let rings: Vec<_> = canvas
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Ring { .. }))
            .collect();
        assert_eq!(rings.len(), 1);
    }

    #[test]
    fn test_labels_outlined_then_cleared() {
        let (snap, positions) = bridge_graph();
        // Below the edge-label threshold, so every text call is a node label
        let (canvas, _) = render(&snap, &positions, None, RegimeMode::Compare, 1.2);

        assert_eq!(canvas.texts().count(), 4);
        for op in canvas.texts() {
            if let DrawOp::Text { text, size, bold, outline, .. } = op {
                assert!(outline.is_some(), "label {} drawn without outline", text);
                assert_eq!(*size, LABEL_FONT_SIZE / 1.2);
                let is_law = snap
                    .nodes()
                    .iter()
                    .any(|n| &n.label == text && n.entity_type == EntityType::Law);
                assert_eq!(*bold, is_law, "{}", text);
            }
        }
        assert!(canvas.text_outline().is_none());
    }

    #[test]
    fn test_equivalence_edges_are_dashed() {
        let (snap, positions) = bridge_graph();
        let (canvas, stats) = render(&snap, &positions, None, RegimeMode::Compare, 1.0);
        assert_eq!(stats.edges_drawn, 2);

        let palette = GraphPalette::default();
        let lines: Vec<_> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Line { stroke, dashed, .. } => Some((*stroke, *dashed)),
                _ => None,
            })
            .collect();
        assert!(lines.contains(&(Stroke::new(2.0, palette.equivalence_edge), true)));
        assert!(lines.contains(&(Stroke::new(1.0, palette.edge_color), false)));
    }

    #[test]
    fn test_edge_labels_follow_zoom_threshold() {
        let (snap, positions) = bridge_graph();

        let (canvas, stats) = render(&snap, &positions, None, RegimeMode::Compare, 1.0);
        assert_eq!(stats.edge_labels_drawn, 0);
        assert!(!canvas.texts().any(|op| matches!(op, DrawOp::Text { text, .. } if text == "DEFINES")));

        let (canvas, stats) = render(&snap, &positions, None, RegimeMode::Compare, 1.5);
        assert_eq!(stats.edge_labels_drawn, 2);
        let backgrounds = canvas
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { color, .. } if *color == GraphPalette::default().edge_label_bg))
            .count();
        assert_eq!(backgrounds, 2);
    }

    #[test]
    fn test_missing_positions_skip_without_failing() {
        let (snap, mut positions) = bridge_graph();
        positions.remove("murder");
        positions.insert("art_21".into(), Pos2::new(f32::NAN, 0.0));

        let (_, stats) = render(&snap, &positions, None, RegimeMode::Compare, 1.0);
        assert_eq!(stats.nodes_drawn, 2);
        assert_eq!(stats.nodes_skipped, 2);
        assert_eq!(stats.edges_drawn, 1);
        assert_eq!(stats.edges_skipped, 1);
    }

    #[test]
    fn test_tooltip_drawn_last_above_node() {
        let (snap, positions) = bridge_graph();
        let (canvas, stats) = render(&snap, &positions, Some("murder"), RegimeMode::Compare, 1.0);
        assert!(stats.tooltip_drawn);

        let last = canvas.ops.last().unwrap();
        assert!(matches!(last, DrawOp::Text { text, .. } if text == "Cited in answer"));

        let rect = canvas
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Rect { rect, color } if *color == GraphPalette::default().tooltip_bg => Some(*rect),
                _ => None,
            })
            .unwrap();
        assert!(rect.max.y < 100.0 - CITED_RADIUS);
        assert_eq!(rect.height(), 2.0 * TOOLTIP_LINE_HEIGHT + 2.0 * TOOLTIP_PADDING);
        assert!(canvas.texts().any(|op| matches!(op, DrawOp::Text { text, .. } if text == "Murder")));
    }

    #[test]
    fn test_no_tooltip_without_text() {
        let (snap, positions) = bridge_graph();
        let (_, stats) = render(&snap, &positions, Some("art_21"), RegimeMode::Compare, 1.0);
        assert!(!stats.tooltip_drawn);
    }

    #[test]
    fn test_blank_tooltip_is_not_counted() {
        for text in ["", "**\n  "] {
            let mut blank = node("murder", "Murder");
            blank.metadata = Some(NodeMetadata {
                tooltip: Some(text.into()),
                is_cited: None,
                relationship_count: None,
            });
            let snap = build(&GraphPayload {
                nodes: vec![blank],
                ..Default::default()
            })
            .unwrap();
            let positions = HashMap::from([("murder".to_string(), Pos2::ZERO)]);

            let (canvas, stats) = render(&snap, &positions, Some("murder"), RegimeMode::Compare, 1.0);
            assert!(!stats.tooltip_drawn, "{:?}", text);
            assert!(!canvas.ops.iter().any(|op| matches!(op, DrawOp::Rect { .. })));
        }
    }

    #[test]
    fn test_hit_testing() {
        let (snap, positions) = bridge_graph();
        assert_eq!(node_at(&snap, &positions, Pos2::new(3.0, 4.0), 1.0).unwrap().id, "ipc_302");
        assert_eq!(node_at(&snap, &positions, Pos2::new(-100.0, 7.0), 1.0).unwrap().id, "art_21");
        assert!(node_at(&snap, &positions, Pos2::new(50.0, 50.0), 1.0).is_none());
    }

    #[test]
    fn test_node_fill_matches_type() {
        let (snap, _) = bridge_graph();
        let palette = GraphPalette::default();
        let art = snap.get("art_21").unwrap();
        assert_eq!(node_fill(&palette, art, false), color_for(EntityType::Section));
        assert_eq!(node_fill(&palette, art, true), palette.hover_highlight);
    }
}
