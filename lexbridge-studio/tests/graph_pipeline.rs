//! Service payload → store → focus → render, without a window

use lexbridge_studio::diagram::{
    build, ForceLayout, FrameInput, GraphPalette, GraphRenderer, LayoutConfig, PositionSource,
    RecordingCanvas, RenderSettings,
};
use lexbridge_studio::error::LexError;
use lexbridge_studio::service::QueryResponse;
use lexbridge_studio::viewport::{
    Camera, FocusController, FocusTimings, RegimeMode, StoreEvent, ViewportStore,
};
use std::sync::mpsc::Receiver;

const ASK_RESPONSE: &str = r#"{
    "answer": "Section 302 IPC now maps to Section 103 BNS.",
    "citations": [
        {"uuid": "c-ipc", "text": "Whoever commits murder...", "source_doc": "IPC_1860.pdf",
         "page_number": 77, "entity_name": "Section 302 IPC", "score": 0.91},
        {"uuid": "c-bns", "text": "Whoever commits murder...", "source_doc": "BNS_2023.pdf",
         "page_number": 41, "entity_name": "Section 103 BNS", "score": 0.88}
    ],
    "metadata": {},
    "graph_data": {
        "nodes": [
            {"id": "ipc302", "label": "Section 302 IPC", "type": "entity", "citation_uuid": "c-ipc",
             "metadata": {"tooltip": "**Section 302 IPC**\nPunishment for murder", "is_cited": true}},
            {"id": "bns103", "label": "Section 103 BNS", "type": "entity", "citation_uuid": "c-bns",
             "metadata": {"is_cited": true}},
            {"id": "murder", "label": "Murder", "type": "entity"},
            {"id": "nanavati", "label": "K.M. Nanavati v. State of Maharashtra", "type": "entity"}
        ],
        "edges": [
            {"source": "ipc302", "target": "bns103", "relation": "REPLACED_BY", "label": "replaced by"},
            {"source": "ipc302", "target": "murder", "relation": "DEFINES"},
            {"source": "nanavati", "target": "ipc302", "relation": "INTERPRETS"},
            {"source": "ghost", "target": "murder", "relation": "MENTIONS"}
        ]
    }
}"#;

fn drain(rx: &Receiver<StoreEvent>) -> Vec<StoreEvent> {
    rx.try_iter().collect()
}

fn settled_layout(store: &ViewportStore) -> ForceLayout {
    let snapshot = store.snapshot();
    let mut layout = ForceLayout::new(LayoutConfig::default());
    layout.reset_for(&snapshot);
    for _ in 0..300 {
        if layout.step(&snapshot) {
            break;
        }
    }
    layout
}

fn loaded_store() -> (ViewportStore, Receiver<StoreEvent>) {
    let response: QueryResponse = serde_json::from_str(ASK_RESPONSE).unwrap();
    let payload = response.graph_data.expect("ask response carries a graph");

    let mut store = ViewportStore::new();
    let events = store.subscribe();
    let token = store.issue_request();
    store.apply_snapshot(token, build(&payload)).unwrap();
    (store, events)
}

#[test]
fn payload_is_validated_and_published() {
    let (store, events) = loaded_store();
    let snapshot = store.snapshot();

    assert_eq!(snapshot.nodes().len(), 4);
    assert_eq!(snapshot.edges().len(), 3);
    assert_eq!(snapshot.dropped_edges, 1);
    assert!(snapshot.edges().iter().all(|e| e.source != "ghost"));
    assert_eq!(
        drain(&events),
        vec![StoreEvent::SnapshotReplaced { nodes: 4, edges: 3 }]
    );
}

#[test]
fn late_response_does_not_replace_newer_graph() {
    let (mut store, events) = loaded_store();
    drain(&events);

    let slow = store.issue_request();
    let fast = store.issue_request();

    store
        .apply_snapshot(fast, Ok(lexbridge_studio::GraphSnapshot::empty()))
        .unwrap();
    let result = store.apply_snapshot(slow, build(&Default::default()));

    assert!(matches!(result, Err(LexError::StaleResponse { .. })));
    assert!(store.snapshot().is_empty());
    assert_eq!(
        drain(&events),
        vec![StoreEvent::SnapshotReplaced { nodes: 0, edges: 0 }]
    );
}

#[test]
fn citation_click_focuses_its_node() {
    let (mut store, events) = loaded_store();
    let layout = settled_layout(&store);
    drain(&events);

    store.activate_citation("c-bns");
    let uuid = match drain(&events).as_slice() {
        [StoreEvent::CitationActivated(uuid)] => uuid.clone(),
        other => panic!("unexpected events {:?}", other),
    };

    let timings = FocusTimings::default();
    let mut focus = FocusController::new(timings);
    let mut camera = Camera::default();
    assert!(focus.request_focus(&uuid, &store.snapshot(), &layout, &camera));

    let mut frames = 0;
    while !focus.is_idle() && frames < 600 {
        focus.tick(1.0 / 60.0, &mut camera);
        frames += 1;
    }

    assert!(focus.is_idle());
    assert_eq!(Some(camera.center), layout.position("bns103"));
    assert_eq!(camera.zoom, timings.target_zoom);
}

#[test]
fn unknown_citation_leaves_camera_alone() {
    let (store, _events) = loaded_store();
    let layout = settled_layout(&store);

    let mut focus = FocusController::default();
    let camera = Camera::default();
    assert!(!focus.request_focus("not-in-graph", &store.snapshot(), &layout, &camera));
    assert!(focus.is_idle());
}

#[test]
fn current_regime_dims_legacy_nodes_only() {
    let (mut store, _events) = loaded_store();
    store.set_regime_mode(RegimeMode::Current);
    let layout = settled_layout(&store);
    let snapshot = store.snapshot();

    let renderer = GraphRenderer::new(GraphPalette::default(), RenderSettings::default());
    let mut canvas = RecordingCanvas::new();
    let stats = renderer.render_frame(
        &mut canvas,
        &FrameInput {
            snapshot: &snapshot,
            positions: &layout,
            hovered: store.hovered(),
            regime_mode: store.regime_mode(),
            zoom: 1.0,
        },
    );

    assert_eq!(stats.nodes_drawn, 4);
    assert_eq!(stats.edges_drawn, 3);
    assert_eq!(stats.edge_labels_drawn, 0);

    let alpha = |id: &str| {
        let pos = layout.position(id).unwrap();
        canvas.circle_at(pos).unwrap().1.a()
    };
    assert!(alpha("ipc302") as f32 <= 0.15 * 255.0);
    assert_eq!(alpha("bns103"), 255);
    assert_eq!(alpha("murder"), 255);
    assert_eq!(alpha("nanavati"), 255);
}

#[test]
fn hovering_shows_tooltip_at_full_opacity() {
    let (mut store, _events) = loaded_store();
    store.set_regime_mode(RegimeMode::Current);
    store.set_hovered(Some("ipc302".to_string()));
    let layout = settled_layout(&store);
    let snapshot = store.snapshot();

    let renderer = GraphRenderer::new(GraphPalette::default(), RenderSettings::default());
    let mut canvas = RecordingCanvas::new();
    let stats = renderer.render_frame(
        &mut canvas,
        &FrameInput {
            snapshot: &snapshot,
            positions: &layout,
            hovered: store.hovered(),
            regime_mode: store.regime_mode(),
            zoom: 2.0,
        },
    );

    assert!(stats.tooltip_drawn);
    assert_eq!(stats.edge_labels_drawn, 1);
    let pos = layout.position("ipc302").unwrap();
    assert_eq!(canvas.circle_at(pos).unwrap().1.a(), 255);
}
