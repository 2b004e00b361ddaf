//! Incremental force-directed layout
//!
//! Owns node positions between frames. The renderer never writes positions;
//! it reads them through `PositionSource`. Positions are keyed by node id so
//! that nodes surviving a snapshot replacement keep their place.

use super::graph::GraphSnapshot;
use eframe::egui::{Pos2, Rect, Vec2};
use std::collections::HashMap;

/// Read-only view of node positions
pub trait PositionSource {
    fn position(&self, id: &str) -> Option<Pos2>;
}

impl PositionSource for HashMap<String, Pos2> {
    fn position(&self, id: &str) -> Option<Pos2> {
        self.get(id).copied()
    }
}

/// Layout configuration
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Repulsion strength between every pair of nodes
    pub repulsion: f32,
    /// Spring strength along edges
    pub attraction: f32,
    /// Rest length of an edge spring
    pub ideal_length: f32,
    /// Pull toward the origin, keeps disconnected parts on screen
    pub gravity: f32,
    /// Velocity damping factor
    pub damping: f32,
    /// Largest per-axis force applied in one step
    pub max_force: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            repulsion: 8000.0,
            attraction: 0.05,
            ideal_length: 90.0,
            gravity: 0.01,
            damping: 0.85,
            max_force: 50.0,
        }
    }
}

/// Force layout state, advanced one step per frame
#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    positions: HashMap<String, Pos2>,
    velocities: HashMap<String, Vec2>,
    pub config: LayoutConfig,
    converged: bool,
}

impl PositionSource for ForceLayout {
    fn position(&self, id: &str) -> Option<Pos2> {
        self.positions.get(id).copied()
    }
}

impl ForceLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Re-seed for a new snapshot. Known ids keep their position, new ids are
    /// placed on a circle, ids no longer present are forgotten.
    pub fn reset_for(&mut self, snapshot: &GraphSnapshot) {
        let n = snapshot.nodes().len();
        let radius = (n as f32).sqrt() * 60.0 + 40.0;

        let mut positions = HashMap::with_capacity(n);
        for (i, node) in snapshot.nodes().iter().enumerate() {
            let pos = self.positions.get(&node.id).copied().unwrap_or_else(|| {
                let angle = 2.0 * std::f32::consts::PI * i as f32 / n.max(1) as f32;
                Pos2::new(angle.cos() * radius, angle.sin() * radius)
            });
            positions.insert(node.id.clone(), pos);
        }

        self.velocities.retain(|id, _| positions.contains_key(id));
        self.positions = positions;
        self.converged = n == 0;
    }

    /// Move a node directly (dragging). Wakes the simulation.
    pub fn set_position(&mut self, id: &str, pos: Pos2) {
        if let Some(p) = self.positions.get_mut(id) {
            *p = pos;
            self.velocities.remove(id);
            self.converged = false;
        }
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Bounding box of all positions
    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.positions.values();
        let first = *iter.next()?;
        let mut rect = Rect::from_min_max(first, first);
        for p in iter {
            rect.extend_with(*p);
        }
        Some(rect)
    }

    /// Advance one step. Returns true once forces are small.
    pub fn step(&mut self, snapshot: &GraphSnapshot) -> bool {
        let nodes = snapshot.nodes();
        let n = nodes.len();
        if n == 0 || self.converged {
            return true;
        }

        let ids: Vec<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
        let pos: Vec<Pos2> = ids
            .iter()
            .map(|id| self.positions.get(*id).copied().unwrap_or(Pos2::ZERO))
            .collect();
        let slot: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut forces = vec![Vec2::ZERO; n];

        // Repulsion
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = pos[j] - pos[i];
                let dist = delta.length().max(1.0);
                let dir = if delta.length() < f32::EPSILON {
                    // Coincident nodes: separate along a fixed per-pair direction
                    Vec2::angled((i * 31 + j * 17) as f32)
                } else {
                    delta / dist
                };
                let force = dir * (self.config.repulsion / (dist * dist));
                forces[i] -= force;
                forces[j] += force;
            }
        }

        // Attraction
        for edge in snapshot.edges() {
            let (Some(&a), Some(&b)) = (slot.get(edge.source.as_str()), slot.get(edge.target.as_str())) else {
                continue;
            };
            if a == b {
                continue;
            }
            let delta = pos[b] - pos[a];
            let dist = delta.length().max(1.0);
            let force = delta / dist * (dist - self.config.ideal_length) * self.config.attraction;
            forces[a] += force;
            forces[b] -= force;
        }

        // Gravity, then apply
        let mut max_force = 0.0f32;
        for (i, id) in ids.iter().enumerate() {
            let force = forces[i] - pos[i].to_vec2() * self.config.gravity;
            let clamped = Vec2::new(
                force.x.clamp(-self.config.max_force, self.config.max_force),
                force.y.clamp(-self.config.max_force, self.config.max_force),
            );
            let vel = self.velocities.entry(id.to_string()).or_insert(Vec2::ZERO);
            *vel = (*vel + clamped) * self.config.damping;
            if let Some(p) = self.positions.get_mut(*id) {
                *p += *vel * 0.1;
            }
            max_force = max_force.max(force.length());
        }

        self.converged = max_force < 1.0;
        self.converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::graph::{build, GraphPayload, RawEdge, RawNode};

    fn snapshot(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot {
        let payload = GraphPayload {
            nodes: ids
                .iter()
                .map(|id| RawNode {
                    id: Some(id.to_string()),
                    label: Some(id.to_string()),
                    ..Default::default()
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(s, t)| RawEdge {
                    source: Some(s.to_string()),
                    target: Some(t.to_string()),
                    relation: Some("RELATED_TO".to_string()),
                    label: None,
                })
                .collect(),
            stats: None,
        };
        build(&payload).unwrap()
    }

    #[test]
    fn test_reset_seeds_every_node() {
        let snap = snapshot(&["a", "b", "c"], &[("a", "b")]);
        let mut layout = ForceLayout::default();
        layout.reset_for(&snap);

        for id in ["a", "b", "c"] {
            assert!(layout.position(id).is_some());
        }
        assert!(layout.position("d").is_none());
        assert!(layout.bounds().unwrap().width() > 0.0);
    }

    #[test]
    fn test_reset_keeps_surviving_positions() {
        let mut layout = ForceLayout::default();
        layout.reset_for(&snapshot(&["a", "b"], &[]));
        layout.set_position("a", Pos2::new(500.0, -20.0));

        layout.reset_for(&snapshot(&["a", "c"], &[]));
        assert_eq!(layout.position("a"), Some(Pos2::new(500.0, -20.0)));
        assert!(layout.position("b").is_none());
        assert!(layout.position("c").is_some());
    }

    #[test]
    fn test_step_moves_nodes_and_stays_finite() {
        let snap = snapshot(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let mut layout = ForceLayout::default();
        layout.reset_for(&snap);
        let before = layout.position("a").unwrap();

        for _ in 0..200 {
            layout.step(&snap);
        }

        let after = layout.position("a").unwrap();
        assert_ne!(before, after);
        for id in ["a", "b", "c", "d"] {
            let p = layout.position(id).unwrap();
            assert!(p.x.is_finite() && p.y.is_finite());
        }
    }

    #[test]
    fn test_empty_snapshot_is_converged() {
        let mut layout = ForceLayout::default();
        layout.reset_for(&GraphSnapshot::empty());
        assert!(layout.step(&GraphSnapshot::empty()));
        assert!(layout.bounds().is_none());
    }
}
