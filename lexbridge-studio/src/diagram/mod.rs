//! Knowledge graph: classification, snapshot model, layout and rendering
//!
//! - `classify`: label → entity type and regime
//! - `graph`: validated, immutable snapshots built from service payloads
//! - `layout`: incremental force layout that owns node positions
//! - `renderer`: per-frame drawing onto a `Canvas`
//! - `view`: the egui widget tying them to the camera and store

pub mod canvas;
pub mod classify;
pub mod graph;
pub mod layout;
pub mod renderer;
pub mod theme_mapper;
pub mod view;

pub use canvas::{Canvas, DrawOp, EguiCanvas, RecordingCanvas};
pub use classify::{classify, color_for, matches_regime, regime_of, EntityType, Regime};
pub use graph::{build, GraphEdge, GraphNode, GraphPayload, GraphSnapshot, GraphStats, RelationKind};
pub use layout::{ForceLayout, LayoutConfig, PositionSource};
pub use renderer::{node_at, node_opacity, FrameInput, FrameStats, GraphRenderer, RenderSettings};
pub use theme_mapper::GraphPalette;
pub use view::{GraphView, GraphViewResponse};
