//! Focus controller
//!
//! Two-phase camera animation toward a node: center on it, then zoom in.
//! Driven by `tick(dt)` once per frame; no callbacks and no drawing surface,
//! so interruption and restart can be tested directly.
//!
//! ```text
//! Idle ──request_focus──▶ Centering ──done──▶ Zooming ──done──▶ Idle
//!                            ▲                   │
//!                            └──request_focus────┘
//! ```

use super::camera::Camera;
use crate::diagram::graph::GraphSnapshot;
use crate::diagram::layout::PositionSource;
use eframe::egui::Pos2;

/// Durations and the close-up zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusTimings {
    pub center_secs: f32,
    pub zoom_secs: f32,
    pub target_zoom: f32,
}

impl Default for FocusTimings {
    fn default() -> Self {
        Self {
            center_secs: 0.5,
            zoom_secs: 1.0,
            target_zoom: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FocusState {
    #[default]
    Idle,
    Centering {
        node_id: String,
        from: Pos2,
        to: Pos2,
        elapsed: f32,
    },
    Zooming {
        node_id: String,
        from: f32,
        to: f32,
        elapsed: f32,
    },
}

impl FocusState {
    pub fn name(&self) -> &'static str {
        match self {
            FocusState::Idle => "idle",
            FocusState::Centering { .. } => "centering",
            FocusState::Zooming { .. } => "zooming",
        }
    }

    /// Node the current animation heads for
    pub fn target(&self) -> Option<&str> {
        match self {
            FocusState::Idle => None,
            FocusState::Centering { node_id, .. } | FocusState::Zooming { node_id, .. } => {
                Some(node_id)
            }
        }
    }
}

/// Smoothstep easing on `[0, 1]`
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).min(1.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FocusController {
    state: FocusState,
    pub timings: FocusTimings,
}

impl FocusController {
    pub fn new(timings: FocusTimings) -> Self {
        Self {
            state: FocusState::Idle,
            timings,
        }
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == FocusState::Idle
    }

    /// Start animating toward the node whose citation uuid or id equals `key`.
    ///
    /// Returns false, leaving all state untouched, when no such node exists or
    /// it has no position yet. A request while animating restarts from
    /// `Centering` at the camera's current center.
    pub fn request_focus(
        &mut self,
        key: &str,
        snapshot: &GraphSnapshot,
        positions: &dyn PositionSource,
        camera: &Camera,
    ) -> bool {
        let Some(node) = snapshot.find_focus_target(key) else {
            log::debug!("Focus request for '{}' ignored: no such node", key);
            return false;
        };
        let Some(to) = positions.position(&node.id) else {
            log::debug!("Focus request for '{}' ignored: node not laid out", key);
            return false;
        };

        if let Some(previous) = self.state.target() {
            log::debug!("Focus on '{}' interrupted by '{}'", previous, node.id);
        }

        self.state = FocusState::Centering {
            node_id: node.id.clone(),
            from: camera.center,
            to,
            elapsed: 0.0,
        };
        true
    }

    /// Drop any running animation, leaving the camera where it is
    pub fn cancel(&mut self) {
        self.state = FocusState::Idle;
    }

    /// Advance by `dt` seconds. Returns true while an animation is running.
    pub fn tick(&mut self, dt: f32, camera: &mut Camera) -> bool {
        let dt = dt.max(0.0);

        match &mut self.state {
            FocusState::Idle => return false,
            FocusState::Centering {
                node_id,
                from,
                to,
                elapsed,
            } => {
                *elapsed += dt;
                let t = progress(*elapsed, self.timings.center_secs);
                camera.center = if t >= 1.0 {
                    *to
                } else {
                    from.lerp(*to, smoothstep(t))
                };

                if t >= 1.0 {
                    let leftover = (*elapsed - self.timings.center_secs).max(0.0);
                    self.state = FocusState::Zooming {
                        node_id: std::mem::take(node_id),
                        from: camera.zoom,
                        to: self.timings.target_zoom,
                        elapsed: 0.0,
                    };
                    if leftover > 0.0 {
                        return self.tick(leftover, camera);
                    }
                }
            }
            FocusState::Zooming {
                from, to, elapsed, ..
            } => {
                *elapsed += dt;
                let t = progress(*elapsed, self.timings.zoom_secs);
                camera.zoom = if t >= 1.0 {
                    *to
                } else {
                    *from + (*to - *from) * smoothstep(t)
                };

                if t >= 1.0 {
                    self.state = FocusState::Idle;
                }
            }
        }

        !self.is_idle()
    }
}
