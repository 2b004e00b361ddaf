//! Citation Resolver
//!
//! Rewrites generated prose into annotated text where every known entity
//! name becomes `[name](uuid)`. The host renders those spans as clickable
//! regions; clicking one publishes the uuid as the active citation.
//!
//! Two replacement policies are available:
//! - `Sequential`: longest name first, each name replaced across the whole
//!   current text before moving to the next. Shorter names can re-match the
//!   visible label of a span inserted earlier, and equal-length names claim
//!   text in input order rather than left to right.
//! - `SinglePass`: all whole-word matches are collected against the original
//!   text, conflicts go to the longer then earlier match, and the text is
//!   rewritten once. Never produces nested spans.

use super::Citation;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// How entity names are substituted into the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// Legacy per-entity replacement, longest first
    Sequential,
    /// Non-overlapping spans computed up front, applied once
    #[default]
    #[serde(alias = "single_pass")]
    SinglePass,
}

impl ResolutionPolicy {
    pub fn all() -> &'static [ResolutionPolicy] {
        &[ResolutionPolicy::Sequential, ResolutionPolicy::SinglePass]
    }

    /// Display name; also the spelling used in config files
    pub fn name(&self) -> &'static str {
        match self {
            ResolutionPolicy::Sequential => "sequential",
            ResolutionPolicy::SinglePass => "single-pass",
        }
    }
}

/// An entity name and the citation it links to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityLink {
    pub name: String,
    pub uuid: String,
}

/// Entity name -> citation uuid, unique names, first occurrence wins.
///
/// Keeps discovery order so that ties in the longest-first ordering are
/// broken by input order.
#[derive(Debug, Clone, Default)]
pub struct EntityMap {
    links: Vec<EntityLink>,
    index: HashMap<String, usize>,
}

impl EntityMap {
    /// Uuid for an entity name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.links[i].uuid.as_str())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &EntityLink> {
        self.links.iter()
    }

    /// Links sorted by name length (in characters), longest first.
    /// The sort is stable, so equal lengths keep discovery order.
    pub fn by_length(&self) -> Vec<&EntityLink> {
        let mut ordered: Vec<&EntityLink> = self.links.iter().collect();
        ordered.sort_by(|a, b| b.name.chars().count().cmp(&a.name.chars().count()));
        ordered
    }

    /// Whether any entity links to this uuid
    pub fn links_to(&self, uuid: &str) -> bool {
        self.links.iter().any(|link| link.uuid == uuid)
    }
}

/// Build the entity map from a citation list, in input order.
pub fn build_entity_map(citations: &[Citation]) -> EntityMap {
    let mut map = EntityMap::default();

    for citation in citations {
        let Some(name) = citation.entity() else {
            continue;
        };
        if map.index.contains_key(name) {
            log::debug!(
                "Entity '{}' already linked to {}, ignoring {}",
                name,
                map.get(name).unwrap_or_default(),
                citation.uuid
            );
            continue;
        }
        map.index.insert(name.to_string(), map.links.len());
        map.links.push(EntityLink {
            name: name.to_string(),
            uuid: citation.uuid.clone(),
        });
    }

    map
}

/// One replacement applied to the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Entity name that matched
    pub entity: String,
    /// Citation it links to
    pub uuid: String,
    /// Byte offset of the match. For `SinglePass` this is an offset into the
    /// original text; for `Sequential` it is an offset into the text as it
    /// stood when this entity was processed.
    pub offset: usize,
}

/// Draft text with citation links applied
#[derive(Debug, Clone)]
pub struct ResolvedDraft {
    pub original: String,
    pub annotated: String,
    pub substitutions: Vec<Substitution>,
    pub policy: ResolutionPolicy,
    linked: HashSet<String>,
}

impl ResolvedDraft {
    /// True when nothing was linked
    pub fn is_unchanged(&self) -> bool {
        self.substitutions.is_empty()
    }

    /// Annotated text split into plain runs and clickable links
    pub fn segments(&self) -> Vec<Segment> {
        parse_annotated(&self.annotated, |uuid| self.linked.contains(uuid))
    }
}

/// Piece of annotated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Link { label: String, uuid: String },
}

/// Resolve with the default policy
pub fn resolve(text: &str, citations: &[Citation]) -> ResolvedDraft {
    resolve_with(text, citations, ResolutionPolicy::default())
}

/// Resolve entity names in `text` into citation links
pub fn resolve_with(text: &str, citations: &[Citation], policy: ResolutionPolicy) -> ResolvedDraft {
    let map = build_entity_map(citations);

    let (annotated, substitutions) = match policy {
        ResolutionPolicy::Sequential => resolve_sequential(text, &map),
        ResolutionPolicy::SinglePass => resolve_single_pass(text, &map),
    };

    log::debug!(
        "Resolved draft ({}): {} entities, {} substitutions",
        policy.name(),
        map.len(),
        substitutions.len()
    );

    ResolvedDraft {
        original: text.to_string(),
        annotated,
        linked: substitutions.iter().map(|s| s.uuid.clone()).collect(),
        substitutions,
        policy,
    }
}

fn annotate(name: &str, uuid: &str) -> String {
    format!("[{}]({})", name, uuid)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Literal, case-sensitive pattern for an entity name
fn literal_pattern(name: &str) -> Option<Regex> {
    match Regex::new(&regex::escape(name)) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("Skipping entity '{}': {}", name, e);
            None
        }
    }
}

/// Byte spans of whole-word occurrences: no word character directly before
/// or after the match.
fn whole_word_spans(text: &str, pattern: &Regex) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(m) = pattern.find_at(text, pos) else {
            break;
        };
        if m.start() == m.end() {
            break;
        }

        let clear_before = text[..m.start()]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let clear_after = text[m.end()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));

        if clear_before && clear_after {
            spans.push((m.start(), m.end()));
            pos = m.end();
        } else {
            // Retry one character further; the name may occur overlapping itself
            pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
    }

    spans
}

fn resolve_sequential(text: &str, map: &EntityMap) -> (String, Vec<Substitution>) {
    let mut current = text.to_string();
    let mut substitutions = Vec::new();

    for link in map.by_length() {
        let Some(pattern) = literal_pattern(&link.name) else {
            continue;
        };
        let spans = whole_word_spans(&current, &pattern);
        if spans.is_empty() {
            continue;
        }

        let mut next = String::with_capacity(current.len() + spans.len() * (link.uuid.len() + 4));
        let mut last = 0;
        for (start, end) in spans {
            next.push_str(&current[last..start]);
            next.push_str(&annotate(&link.name, &link.uuid));
            substitutions.push(Substitution {
                entity: link.name.clone(),
                uuid: link.uuid.clone(),
                offset: start,
            });
            last = end;
        }
        next.push_str(&current[last..]);
        current = next;
    }

    (current, substitutions)
}

struct Candidate<'a> {
    start: usize,
    end: usize,
    chars: usize,
    link: &'a EntityLink,
}

fn resolve_single_pass(text: &str, map: &EntityMap) -> (String, Vec<Substitution>) {
    let mut candidates = Vec::new();
    for link in map.by_length() {
        let Some(pattern) = literal_pattern(&link.name) else {
            continue;
        };
        let chars = link.name.chars().count();
        for (start, end) in whole_word_spans(text, &pattern) {
            candidates.push(Candidate {
                start,
                end,
                chars,
                link,
            });
        }
    }

    // Longer wins, then earlier
    candidates.sort_by(|a, b| b.chars.cmp(&a.chars).then(a.start.cmp(&b.start)));

    let mut accepted: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let overlaps = accepted
            .iter()
            .any(|a| candidate.start < a.end && a.start < candidate.end);
        if !overlaps {
            accepted.push(candidate);
        }
    }
    accepted.sort_by_key(|c| c.start);

    let mut annotated = String::with_capacity(text.len());
    let mut substitutions = Vec::with_capacity(accepted.len());
    let mut last = 0;
    for c in &accepted {
        annotated.push_str(&text[last..c.start]);
        annotated.push_str(&annotate(&c.link.name, &c.link.uuid));
        substitutions.push(Substitution {
            entity: c.link.name.clone(),
            uuid: c.link.uuid.clone(),
            offset: c.start,
        });
        last = c.end;
    }
    annotated.push_str(&text[last..]);

    (annotated, substitutions)
}

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\[([^\[\]]+)\]\(([^()\s]+)\)").ok())
        .as_ref()
}

/// Split annotated text into segments. Only `[label](id)` spans whose id
/// passes `is_link` become links; anything else stays plain text.
pub fn parse_annotated(text: &str, is_link: impl Fn(&str) -> bool) -> Vec<Segment> {
    let Some(pattern) = link_pattern() else {
        return vec![Segment::Text(text.to_string())];
    };
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut last = 0;

    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(label), Some(uuid)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if !is_link(uuid.as_str()) {
            continue;
        }
        plain.push_str(&text[last..whole.start()]);
        if !plain.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut plain)));
        }
        segments.push(Segment::Link {
            label: label.as_str().to_string(),
            uuid: uuid.as_str().to_string(),
        });
        last = whole.end();
    }

    plain.push_str(&text[last..]);
    if !plain.is_empty() {
        segments.push(Segment::Text(plain));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cite(entity: &str, uuid: &str) -> Citation {
        Citation {
            uuid: uuid.to_string(),
            text: String::new(),
            entity_name: Some(entity.to_string()),
            source_doc: "doc.pdf".to_string(),
            page_number: 1,
            summary: String::new(),
            score: 0.5,
            law_type: "Statute".to_string(),
        }
    }

    #[test]
    fn test_entity_map_first_occurrence_wins() {
        let citations = vec![
            cite("Section 302", "u1"),
            cite("Section 420", "u2"),
            cite("Section 302", "u3"),
        ];
        let map = build_entity_map(&citations);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Section 302"), Some("u1"));
        assert_eq!(map.get("Section 420"), Some("u2"));
        assert!(!map.links_to("u3"));
    }

    #[test]
    fn test_entity_map_skips_missing_names() {
        let mut unnamed = cite("", "u1");
        unnamed.entity_name = None;
        let citations = vec![unnamed, cite("", "u2"), cite("Article 21", "u3")];
        let map = build_entity_map(&citations);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Article 21"), Some("u3"));
    }

    #[test]
    fn test_by_length_is_stable() {
        let citations = vec![cite("ab", "1"), cite("abcd", "2"), cite("cd", "3"), cite("xyzw", "4")];
        let map = build_entity_map(&citations);
        let names: Vec<&str> = map.by_length().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["abcd", "xyzw", "ab", "cd"]);
    }

    #[test]
    fn test_longer_name_claims_containing_phrase() {
        let citations = vec![cite("Indian Contract Act", "u1"), cite("Act", "u2")];
        let draft = resolve("Under the Indian Contract Act, the Act applies.", &citations);

        assert_eq!(
            draft.annotated,
            "Under the [Indian Contract Act](u1), the [Act](u2) applies."
        );
        assert_eq!(draft.substitutions.len(), 2);
    }

    #[test]
    fn test_sequential_rewraps_inserted_label() {
        let citations = vec![cite("Indian Contract Act", "u1"), cite("Act", "u2")];
        let draft = resolve_with(
            "Under the Indian Contract Act, the Act applies.",
            &citations,
            ResolutionPolicy::Sequential,
        );

        assert_eq!(
            draft.annotated,
            "Under the [Indian Contract [Act](u2)](u1), the [Act](u2) applies."
        );
    }

    #[test]
    fn test_equal_length_names() {
        let citations = vec![cite("cd ef", "u1"), cite("ab cd", "u2")];

        let sequential = resolve_with("ab cd ef", &citations, ResolutionPolicy::Sequential);
        assert_eq!(sequential.annotated, "ab [cd ef](u1)");

        let single = resolve_with("ab cd ef", &citations, ResolutionPolicy::SinglePass);
        assert_eq!(single.annotated, "[ab cd](u2) ef");
    }

    #[test]
    fn test_no_matches_returns_text_unchanged() {
        let citations = vec![cite("Section 302", "u1")];
        let text = "Nothing here refers to any provision.";

        for policy in [ResolutionPolicy::Sequential, ResolutionPolicy::SinglePass] {
            let draft = resolve_with(text, &citations, policy);
            assert_eq!(draft.annotated, text);
            assert!(draft.is_unchanged());
        }
        assert_eq!(resolve(text, &[]).annotated, text);
    }

    #[test]
    fn test_whole_word_only() {
        let citations = vec![cite("Act", "u1"), cite("Section 302", "u2")];
        let draft = resolve("Actor reacts; Section 3020 and Section 302A differ from Section 302.", &citations);

        assert_eq!(
            draft.annotated,
            "Actor reacts; Section 3020 and Section 302A differ from [Section 302](u2)."
        );
    }

    #[test]
    fn test_case_sensitive() {
        let citations = vec![cite("Article 21", "u1")];
        let draft = resolve("article 21 and ARTICLE 21 but Article 21.", &citations);
        assert_eq!(draft.annotated, "article 21 and ARTICLE 21 but [Article 21](u1).");
    }

    #[test]
    fn test_pattern_characters_are_literal() {
        let citations = vec![cite("Art. 21(a)", "u1"), cite("S.3+", "u2")];
        let draft = resolve("See Art. 21(a) and Art 21a, then S.3+ applies.", &citations);
        assert_eq!(
            draft.annotated,
            "See [Art. 21(a)](u1) and Art 21a, then [S.3+](u2) applies."
        );
    }

    #[test]
    fn test_segments() {
        let citations = vec![cite("Section 420", "u1")];
        let draft = resolve("Cheating falls under Section 420 of the code.", &citations);

        assert_eq!(
            draft.segments(),
            vec![
                Segment::Text("Cheating falls under ".to_string()),
                Segment::Link {
                    label: "Section 420".to_string(),
                    uuid: "u1".to_string()
                },
                Segment::Text(" of the code.".to_string()),
            ]
        );
    }

    #[test]
    fn test_segments_ignore_foreign_links() {
        let segments = parse_annotated("see [docs](http) and [Rule 3](u9)", |uuid| uuid == "u9");
        assert_eq!(
            segments,
            vec![
                Segment::Text("see [docs](http) and ".to_string()),
                Segment::Link {
                    label: "Rule 3".to_string(),
                    uuid: "u9".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_containing_name_never_split() {
        // Every (short, long) pair where short is a proper substring of long
        let pairs = [
            ("Act", "Indian Contract Act"),
            ("Section 3", "Section 3 of BNS"),
            ("Penal Code", "Indian Penal Code"),
            ("Code", "Code of Civil Procedure"),
        ];

        for (short, long) in pairs {
            let text = format!("Per the {long}; see also {short}.");
            // Input order puts the short name first to make sure order is not what saves us
            let citations = vec![cite(short, "short"), cite(long, "long")];
            let draft = resolve(&text, &citations);

            assert!(
                draft.annotated.contains(&format!("[{long}](long)")),
                "{long} not linked whole in {}",
                draft.annotated
            );
            for segment in draft.segments() {
                if let Segment::Link { label, uuid } = segment {
                    assert!(uuid != "short" || label == short);
                }
            }
            assert_eq!(draft.annotated.matches("](short)").count(), 1);
        }
    }
}
