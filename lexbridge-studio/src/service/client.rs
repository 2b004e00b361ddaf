//! Blocking HTTP client for the research service
//!
//! Calls block; the desktop app runs them on worker threads.

use super::models::{
    AuditReport, DraftRequest, ErrorBody, HealthResponse, QueryRequest, QueryResponse,
    MIN_QUERY_CHARS,
};
use crate::config::AppConfig;
use crate::error::{LexError, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL
    pub base_url: String,
    pub timeout: Duration,
    pub language: String,
    pub input_language: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(120),
            language: "English".to_string(),
            input_language: "English".to_string(),
        }
    }
}

impl From<&AppConfig> for ClientConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.service_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            language: config.language.clone(),
            input_language: config.input_language.clone(),
        }
    }
}

pub struct ServiceClient {
    config: ClientConfig,
    http_client: Client,
}

impl ServiceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("lexbridge-studio/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Check that the service is up and has its graph loaded
    pub fn health(&self) -> Result<HealthResponse> {
        let response = self.http_client.get(self.url("health")).send()?;
        read_json(response)
    }

    /// Ask a legal question, with graph data
    pub fn ask(&self, query: &str) -> Result<QueryResponse> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Err(LexError::InvalidInput(format!(
                "query must be at least {} characters",
                MIN_QUERY_CHARS
            )));
        }

        let request = QueryRequest {
            query: query.to_string(),
            include_graph_data: true,
            language: self.config.language.clone(),
            input_language: self.config.input_language.clone(),
        };
        log::info!("POST /ask ({} chars)", query.len());

        let response = self
            .http_client
            .post(self.url("ask"))
            .json(&request)
            .send()?;
        read_json(response)
    }

    /// Draft a memo from case facts
    pub fn draft(&self, facts: &str) -> Result<QueryResponse> {
        let facts = facts.trim();
        if facts.is_empty() {
            return Err(LexError::InvalidInput("facts must not be empty".to_string()));
        }

        let request = DraftRequest {
            facts: facts.to_string(),
            language: self.config.language.clone(),
            input_language: self.config.input_language.clone(),
        };
        log::info!("POST /draft ({} chars)", facts.len());

        let response = self
            .http_client
            .post(self.url("draft"))
            .json(&request)
            .send()?;
        read_json(response)
    }

    /// Upload a document for a compliance audit
    pub fn audit_file(&self, path: &Path) -> Result<AuditReport> {
        log::info!("POST /audit {}", path.display());
        let form = Form::new().file("file", path)?;
        self.send_audit(form)
    }

    pub fn audit_bytes(&self, filename: &str, bytes: &[u8]) -> Result<AuditReport> {
        log::info!("POST /audit {} ({} bytes)", filename, bytes.len());
        let part = Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        self.send_audit(Form::new().part("file", part))
    }

    fn send_audit(&self, form: Form) -> Result<AuditReport> {
        let response = self
            .http_client
            .post(self.url("audit"))
            .multipart(form)
            .send()?;
        read_json(response)
    }
}

fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes()?;
    if !status.is_success() {
        return Err(status_error(status.as_u16(), &String::from_utf8_lossy(&body)));
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Error for a non-2xx reply, preferring the `detail` of a JSON error body
fn status_error(status: u16, body: &str) -> LexError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    };
    log::warn!("Service returned {}: {}", status, message);
    LexError::ServiceStatus { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client_at(base_url: &str) -> ServiceClient {
        ServiceClient::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = client_at("http://host:8000/");
        assert_eq!(client.url("/ask"), "http://host:8000/ask");
        assert_eq!(client.url("health"), "http://host:8000/health");
    }

    #[test]
    fn test_status_errors_use_detail() {
        match status_error(503, r#"{"detail":"Audit service unavailable"}"#) {
            LexError::ServiceStatus { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Audit service unavailable");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            status_error(500, "boom"),
            LexError::ServiceStatus { message, .. } if message == "boom"
        ));
        assert!(matches!(
            status_error(422, r#"{"detail":[{"loc":["body","query"]}]}"#),
            LexError::ServiceStatus { message, .. } if message.contains("query")
        ));
    }

    #[test]
    fn test_short_query_rejected_before_sending() {
        let client = client_at("http://127.0.0.1:9");
        assert!(matches!(client.ask("  hi  "), Err(LexError::InvalidInput(_))));
        assert!(matches!(client.draft("   "), Err(LexError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_audit_file_is_io_error() {
        let client = client_at("http://127.0.0.1:9");
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            client.audit_file(&dir.path().join("absent.pdf")),
            Err(LexError::Io(_))
        ));
    }
}
