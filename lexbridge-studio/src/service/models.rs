//! Request and response shapes for the research service

use crate::citation::Citation;
use crate::diagram::graph::GraphPayload;
use serde::{Deserialize, Serialize};

/// Shortest query the service accepts
pub const MIN_QUERY_CHARS: usize = 5;

/// `POST /ask`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    pub include_graph_data: bool,
    /// Language of the answer
    pub language: String,
    /// Language the query is written in
    pub input_language: String,
}

/// `POST /draft`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DraftRequest {
    /// Facts of the case
    pub facts: String,
    pub language: String,
    pub input_language: String,
}

/// Answer from `/ask` or `/draft`. Drafts carry no metadata or graph.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub graph_data: Option<GraphPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

/// One flagged citation in an audited document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditFinding {
    pub citation: String,
    /// `OUTDATED` when a legacy provision has a current equivalent,
    /// `WARNING` for unmatched legacy references
    pub status: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub reasoning: String,
    pub severity: Severity,
}

impl AuditFinding {
    pub fn is_outdated(&self) -> bool {
        self.status.eq_ignore_ascii_case("outdated")
    }
}

/// `POST /audit`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuditReport {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub findings: Vec<AuditFinding>,
    #[serde(default)]
    pub total_citations: usize,
}

impl AuditReport {
    /// Findings ordered most severe first
    pub fn by_severity(&self) -> Vec<&AuditFinding> {
        let mut findings: Vec<&AuditFinding> = self.findings.iter().collect();
        findings.sort_by_key(|f| f.severity);
        findings
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceGraphStats {
    pub nodes: usize,
    pub edges: usize,
}

/// `GET /health`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub orchestrator: Option<String>,
    #[serde(default)]
    pub graph_loaded: bool,
    #[serde(default)]
    pub graph_stats: Option<ServiceGraphStats>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// FastAPI-style error body
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}
