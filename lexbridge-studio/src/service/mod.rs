//! Research service API
//!
//! `/ask` and `/draft` return an answer with citations (and for `/ask`, the
//! graph around them); `/audit` checks an uploaded document for outdated
//! provisions; `/health` reports service state.

pub mod client;
pub mod models;

pub use client::{ClientConfig, ServiceClient};
pub use models::{
    AuditFinding, AuditReport, DraftRequest, HealthResponse, QueryRequest, QueryResponse,
    ServiceGraphStats, Severity,
};
