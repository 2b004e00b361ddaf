//! Citations and citation-linked text
//!
//! - `Citation`: one retrieved passage with provenance, as sent by the service
//! - `resolver`: rewrites generated prose into `[entity](uuid)` annotated text

pub mod resolver;

pub use resolver::{
    build_entity_map, parse_annotated, resolve, resolve_with, EntityLink, EntityMap,
    ResolutionPolicy, ResolvedDraft, Segment, Substitution,
};

use serde::{Deserialize, Serialize};

/// A cited passage of source text.
///
/// Immutable once received. A new query or draft result replaces the whole
/// list, never individual entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Opaque identifier linking text spans and graph nodes to this citation
    pub uuid: String,

    /// Full text of the cited provision
    pub text: String,

    /// Primary entity extracted from the passage (e.g. "Section 302")
    #[serde(default)]
    pub entity_name: Option<String>,

    /// Source document name
    pub source_doc: String,

    /// Page number in the source document
    #[serde(default)]
    pub page_number: i64,

    /// Short summary for tooltips
    #[serde(default)]
    pub summary: String,

    /// Relevance score from vector search
    #[serde(default)]
    pub score: f64,

    /// Kind of law (Constitutional / Statute / ...)
    #[serde(default)]
    pub law_type: String,
}

impl Citation {
    /// Entity name, if present and non-empty
    pub fn entity(&self) -> Option<&str> {
        self.entity_name.as_deref().filter(|name| !name.is_empty())
    }

    /// One-line provenance, e.g. "BNS_2023.pdf p.41"
    pub fn provenance(&self) -> String {
        format!("{} p.{}", self.source_doc, self.page_number)
    }
}
