//! Entity classification
//!
//! Node types are always derived from the label; a type supplied by the
//! service is never trusted. All functions here are total.

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

/// Semantic type of a graph entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Codified statute, code or constitutional instrument
    Law,
    /// Subdivision of a law (section, article, order, rule, part)
    Section,
    /// Reported case
    Case,
    /// Anything else
    #[default]
    Concept,
    /// Not produced by `classify`; kept for type strings we do not recognise
    Other,
}

impl EntityType {
    pub fn name(&self) -> &'static str {
        match self {
            EntityType::Law => "Law",
            EntityType::Section => "Section",
            EntityType::Case => "Case",
            EntityType::Concept => "Concept",
            EntityType::Other => "Other",
        }
    }

    /// Parse a type string; unknown strings map to `Other`
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "law" => EntityType::Law,
            "section" => EntityType::Section,
            "case" => EntityType::Case,
            "concept" => EntityType::Concept,
            _ => EntityType::Other,
        }
    }

    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Law,
            EntityType::Section,
            EntityType::Case,
            EntityType::Concept,
        ]
    }
}

/// One of the two parallel criminal-law naming conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Indian Penal Code and its sections
    Legacy,
    /// Bharatiya Nyaya Sanhita and its sections
    Current,
}

impl Regime {
    pub fn name(&self) -> &'static str {
        match self {
            Regime::Legacy => "IPC (Legacy)",
            Regime::Current => "BNS (Current)",
        }
    }

    pub fn other(&self) -> Regime {
        match self {
            Regime::Legacy => Regime::Current,
            Regime::Current => Regime::Legacy,
        }
    }
}

const LEGACY_TERMS: &[&str] = &["ipc", "penal code"];
const CURRENT_TERMS: &[&str] = &["bns", "bharatiya"];
const LAW_TERMS: &[&str] = &[
    "ipc",
    "penal code",
    "bns",
    "bharatiya",
    "sanhita",
    "constitution",
    "code",
    " act",
];
const SECTION_TERMS: &[&str] = &["section", "article", "order", "rule", "part"];
const CASE_SEPARATORS: &[&str] = &[" v. ", " vs "];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Classify a label. First match wins: law, section, case, concept.
pub fn classify(label: &str) -> EntityType {
    let lower = label.to_lowercase();

    if contains_any(&lower, LAW_TERMS) || lower.starts_with("act ") || lower == "act" {
        EntityType::Law
    } else if contains_any(&lower, SECTION_TERMS) {
        EntityType::Section
    } else if contains_any(&lower, CASE_SEPARATORS) {
        EntityType::Case
    } else {
        EntityType::Concept
    }
}

/// Whether a label uses `regime`'s naming convention. A bridge label such as
/// "Section 302 IPC / Section 103 BNS" matches both.
pub fn matches_regime(label: &str, regime: Regime) -> bool {
    let terms = match regime {
        Regime::Legacy => LEGACY_TERMS,
        Regime::Current => CURRENT_TERMS,
    };
    contains_any(&label.to_lowercase(), terms)
}

/// Single regime tag for display. Legacy markers win when a label mentions
/// both; filtering goes through `matches_regime` instead.
pub fn regime_of(label: &str) -> Option<Regime> {
    if matches_regime(label, Regime::Legacy) {
        Some(Regime::Legacy)
    } else if matches_regime(label, Regime::Current) {
        Some(Regime::Current)
    } else {
        None
    }
}

/// Base display color for a type
pub fn color_for(entity_type: EntityType) -> Color32 {
    match entity_type {
        EntityType::Law => Color32::from_rgb(239, 68, 68),      // red
        EntityType::Section => Color32::from_rgb(59, 130, 246), // blue
        EntityType::Case => Color32::from_rgb(16, 185, 129),    // green
        EntityType::Concept => Color32::from_rgb(245, 158, 11), // amber
        EntityType::Other => Color32::from_rgb(156, 163, 175),  // neutral gray
    }
}
