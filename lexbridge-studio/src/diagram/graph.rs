//! Relationship Graph Data Structures
//!
//! `GraphPayload` mirrors what the service sends. `build` validates it into a
//! `GraphSnapshot`, the immutable graph the renderer draws. Snapshots are
//! swapped whole (behind an `Arc`) and never edited in place.

use super::classify::{classify, regime_of, EntityType, Regime};
use crate::error::{GraphError, LexError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════════
// Wire format
// ═══════════════════════════════════════════════════════════════════════════

/// Graph data as received from the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
    #[serde(default)]
    pub stats: Option<GraphStats>,
}

/// A node as received. Everything is optional here so that a structurally
/// broken payload can be reported instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    /// Ignored; the type is recomputed from the label
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub citation_uuid: Option<String>,
    #[serde(default)]
    pub metadata: Option<NodeMetadata>,
}

/// Optional per-node extras
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub is_cited: Option<bool>,
    #[serde(default)]
    pub relationship_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEdge {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Summary numbers the service attaches to a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    #[serde(default)]
    pub total_nodes: usize,
    #[serde(default)]
    pub total_edges: usize,
    #[serde(default)]
    pub cited_nodes: usize,
    #[serde(default)]
    pub relationship_types: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Snapshot
// ═══════════════════════════════════════════════════════════════════════════

/// Kind of relation an edge represents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Bridge between corresponding legacy and current provisions
    Equivalence,
    /// Any other predicate, kept verbatim for display
    Other(String),
}

impl RelationKind {
    pub fn parse(relation: &str) -> Self {
        let normalized = relation.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "equivalent to" | "equivalent" | "legacy equivalent" => RelationKind::Equivalence,
            _ => RelationKind::Other(relation.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RelationKind::Equivalence => "EQUIVALENT_TO",
            RelationKind::Other(s) => s,
        }
    }

    pub fn is_equivalence(&self) -> bool {
        matches!(self, RelationKind::Equivalence)
    }
}

/// A validated, classified node
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub entity_type: EntityType,
    pub regime: Option<Regime>,
    pub citation_uuid: Option<String>,
    pub tooltip: Option<String>,
    pub is_cited: bool,
}

impl GraphNode {
    /// Build a node from a label, classifying it
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: id.into(),
            entity_type: classify(&label),
            regime: regime_of(&label),
            label,
            citation_uuid: None,
            tooltip: None,
            is_cited: false,
        }
    }

    pub fn is_law(&self) -> bool {
        self.entity_type == EntityType::Law
    }
}

/// An edge whose endpoints both exist in the snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: RelationKind,
    pub label: Option<String>,
}

/// The validated graph currently on screen
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
    pub stats: GraphStats,
    /// Edges dropped at ingestion because an endpoint was unknown
    pub dropped_edges: usize,
}

impl GraphSnapshot {
    /// An empty snapshot (nothing loaded yet)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Node to focus for an external key: a citation uuid first, then a node id
    pub fn find_focus_target(&self, key: &str) -> Option<&GraphNode> {
        self.nodes
            .iter()
            .find(|n| n.citation_uuid.as_deref() == Some(key))
            .or_else(|| self.get(key))
    }

    /// Edges touching a node
    pub fn edges_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id || e.target == id)
    }

    pub fn cited_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_cited).count()
    }

    /// Parse and validate a JSON payload
    pub fn from_json(json: &str) -> Result<Self, LexError> {
        let payload: GraphPayload = serde_json::from_str(json)?;
        Ok(build(&payload)?)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validate a payload into a snapshot.
///
/// Any node without an id or label, or a repeated id, rejects the whole
/// payload. Edges with an unknown endpoint are dropped and counted.
pub fn build(payload: &GraphPayload) -> Result<GraphSnapshot, GraphError> {
    let mut nodes = Vec::with_capacity(payload.nodes.len());
    let mut index = HashMap::with_capacity(payload.nodes.len());

    for (i, raw) in payload.nodes.iter().enumerate() {
        let id = non_empty(&raw.id).ok_or(GraphError::MissingId { index: i })?;
        let label = non_empty(&raw.label).ok_or_else(|| GraphError::MissingLabel {
            index: i,
            id: id.to_string(),
        })?;
        if index.contains_key(id) {
            return Err(GraphError::DuplicateId(id.to_string()));
        }

        let metadata = raw.metadata.clone().unwrap_or_default();
        let mut node = GraphNode::new(id, label);
        node.citation_uuid = raw.citation_uuid.clone().filter(|u| !u.is_empty());
        node.tooltip = metadata.tooltip;
        node.is_cited = metadata.is_cited.unwrap_or(false);

        index.insert(node.id.clone(), nodes.len());
        nodes.push(node);
    }

    let mut edges = Vec::with_capacity(payload.edges.len());
    let mut dropped = 0;
    for raw in &payload.edges {
        match (non_empty(&raw.source), non_empty(&raw.target)) {
            (Some(source), Some(target)) if index.contains_key(source) && index.contains_key(target) => {
                edges.push(GraphEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                    relation: RelationKind::parse(raw.relation.as_deref().unwrap_or_default()),
                    label: raw.label.clone().filter(|l| !l.is_empty()),
                });
            }
            _ => {
                log::warn!(
                    "Dropping edge {:?} -> {:?} ({}): unknown endpoint",
                    raw.source,
                    raw.target,
                    raw.relation.as_deref().unwrap_or("?")
                );
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        log::info!("Graph ingestion dropped {} dangling edge(s)", dropped);
    }

    Ok(GraphSnapshot {
        nodes,
        edges,
        index,
        stats: payload.stats.clone().unwrap_or_default(),
        dropped_edges: dropped,
    })
}
