//! Lexbridge Studio - legal research workbench
//!
//! Links entity names in service answers to their citations, and renders the
//! statute graph around them with IPC/BNS regime filtering and animated focus.

pub mod citation;
pub mod config;
pub mod diagram;
pub mod error;
pub mod service;
pub mod theme;
pub mod viewport;

// Re-export commonly used types
pub use citation::{resolve, resolve_with, Citation, ResolutionPolicy, ResolvedDraft, Segment};
pub use config::AppConfig;
pub use diagram::{build, GraphRenderer, GraphSnapshot, GraphView};
pub use error::{GraphError, LexError, RenderError, Result};
pub use service::{ClientConfig, ServiceClient};
pub use viewport::{FocusController, RegimeMode, ViewportStore};
