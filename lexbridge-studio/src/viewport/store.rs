//! Viewport store
//!
//! Single owner of the shared interaction state: current snapshot, hovered
//! node, active citation and regime filter. Each field has one typed setter;
//! consumers learn about changes by subscribing instead of polling fields.

use crate::diagram::classify::Regime;
use crate::diagram::graph::GraphSnapshot;
use crate::error::{GraphError, LexError};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Which regime the graph emphasises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeMode {
    /// Show legacy names, dim current ones
    Legacy,
    /// Show current names, dim legacy ones
    Current,
    /// No filtering
    #[default]
    Compare,
}

impl RegimeMode {
    pub fn name(&self) -> &'static str {
        match self {
            RegimeMode::Legacy => "IPC (Legacy)",
            RegimeMode::Current => "BNS (Current)",
            RegimeMode::Compare => "Compare",
        }
    }

    pub fn all() -> &'static [RegimeMode] {
        &[RegimeMode::Legacy, RegimeMode::Current, RegimeMode::Compare]
    }

    /// Regime whose nodes are dimmed in this mode
    pub fn dimmed_regime(&self) -> Option<Regime> {
        match self {
            RegimeMode::Legacy => Some(Regime::Current),
            RegimeMode::Current => Some(Regime::Legacy),
            RegimeMode::Compare => None,
        }
    }
}

/// Change notification sent to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A citation link was clicked; carries its uuid
    CitationActivated(String),
    HoverChanged(Option<String>),
    SnapshotReplaced { nodes: usize, edges: usize },
    /// A payload failed validation; the previous snapshot is still current
    SnapshotRejected(String),
    RegimeChanged(RegimeMode),
}

/// Identifies one outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tokens; only the newest is current
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    /// Ok for the latest token, `StaleResponse` otherwise
    pub fn check(&self, token: RequestToken) -> Result<(), LexError> {
        if self.is_latest(token) {
            Ok(())
        } else {
            log::debug!(
                "Discarding stale response #{} (latest #{})",
                token.0,
                self.latest
            );
            Err(LexError::StaleResponse {
                token: token.0,
                latest: self.latest,
            })
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewportStore {
    snapshot: Arc<GraphSnapshot>,
    hovered_node_id: Option<String>,
    active_citation_uuid: Option<String>,
    regime_mode: RegimeMode,
    sequencer: RequestSequencer,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl ViewportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event published from now on
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ── Snapshot ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Replace the snapshot wholesale. Clears hover, since the hovered id may
    /// not exist in the new graph.
    pub fn replace_snapshot(&mut self, snapshot: Arc<GraphSnapshot>) {
        let nodes = snapshot.nodes().len();
        let edges = snapshot.edges().len();
        self.snapshot = snapshot;

        if self.hovered_node_id.take().is_some() {
            self.publish(StoreEvent::HoverChanged(None));
        }
        log::info!("Graph snapshot replaced ({} nodes, {} edges)", nodes, edges);
        self.publish(StoreEvent::SnapshotReplaced { nodes, edges });
    }

    /// Start a new request; any response carrying an older token is stale
    pub fn issue_request(&mut self) -> RequestToken {
        self.sequencer.issue()
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.sequencer.is_latest(token)
    }

    /// Ok if `token` is still the newest request
    pub fn check_fresh(&self, token: RequestToken) -> Result<(), LexError> {
        self.sequencer.check(token)
    }

    /// Install a built snapshot for the response to `token`.
    ///
    /// Stale tokens are rejected without touching state. A build error keeps
    /// the previous snapshot and publishes `SnapshotRejected`.
    pub fn apply_snapshot(
        &mut self,
        token: RequestToken,
        result: Result<GraphSnapshot, GraphError>,
    ) -> Result<(), LexError> {
        self.sequencer.check(token)?;

        match result {
            Ok(snapshot) => {
                self.replace_snapshot(Arc::new(snapshot));
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected graph payload: {}", e);
                self.publish(StoreEvent::SnapshotRejected(e.to_string()));
                Err(e.into())
            }
        }
    }

    // ── Hover ─────────────────────────────────────────────────────────────

    pub fn hovered(&self) -> Option<&str> {
        self.hovered_node_id.as_deref()
    }

    /// Set the hovered node. Ids not in the current snapshot clear hover.
    pub fn set_hovered(&mut self, id: Option<String>) {
        let id = id.filter(|id| self.snapshot.contains(id));
        if id != self.hovered_node_id {
            self.hovered_node_id = id.clone();
            self.publish(StoreEvent::HoverChanged(id));
        }
    }

    // ── Active citation ───────────────────────────────────────────────────

    pub fn active_citation(&self) -> Option<&str> {
        self.active_citation_uuid.as_deref()
    }

    /// Publish a clicked citation. Always emits, so clicking the same link
    /// twice refocuses.
    pub fn activate_citation(&mut self, uuid: impl Into<String>) {
        let uuid = uuid.into();
        log::debug!("Citation activated: {}", uuid);
        self.active_citation_uuid = Some(uuid.clone());
        self.publish(StoreEvent::CitationActivated(uuid));
    }

    pub fn clear_active_citation(&mut self) {
        self.active_citation_uuid = None;
    }

    // ── Regime ────────────────────────────────────────────────────────────

    pub fn regime_mode(&self) -> RegimeMode {
        self.regime_mode
    }

    pub fn set_regime_mode(&mut self, mode: RegimeMode) {
        if mode != self.regime_mode {
            self.regime_mode = mode;
            self.publish(StoreEvent::RegimeChanged(mode));
        }
    }
}
