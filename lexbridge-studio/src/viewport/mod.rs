//! Interaction state: store, camera and focus animation

pub mod camera;
pub mod focus;
pub mod store;

pub use camera::{Camera, Transform};
pub use focus::{smoothstep, FocusController, FocusState, FocusTimings};
pub use store::{RegimeMode, RequestSequencer, RequestToken, StoreEvent, ViewportStore};
