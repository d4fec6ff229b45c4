//! HTTP document store.

use std::time::Duration;

use apidoc_shared::{ApiDocError, Document, Result, path};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::{DocumentStore, EditTarget};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("apidoc/", env!("CARGO_PKG_VERSION"));

/// Talks to a document store over HTTP.
///
/// - `GET  <base>/document`
/// - `POST <base>/projects/<p>[/headers/<h>[/entities/<e>]]`
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base: Url,
}

impl HttpDocumentStore {
    /// Create a client for the store at `base_url`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiDocError::config(format!("invalid store URL '{base_url}': {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiDocError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    /// `<base>/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let url = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path::join_segments(segments)
        );
        Url::parse(&url).map_err(|e| ApiDocError::validation(format!("bad store URL {url}: {e}")))
    }
}

impl DocumentStore for HttpDocumentStore {
    #[instrument(skip_all, fields(base = %self.base))]
    async fn fetch_document(&self) -> Result<Document> {
        let url = self.endpoint(&["document"])?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiDocError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiDocError::Fetch(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiDocError::Fetch(format!("{url}: failed to read body: {e}")))?;

        let document = Document::from_json(&body)?;
        info!(projects = document.projects.len(), bytes = body.len(), "document fetched");
        Ok(document)
    }

    #[instrument(skip_all, fields(edit = %target))]
    async fn post(&self, target: &EditTarget, patch: &Value) -> Result<()> {
        let url = self.endpoint(&target.segments())?;

        let response = self
            .client
            .post(url.clone())
            .json(patch)
            .send()
            .await
            .map_err(|e| ApiDocError::Post(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.trim();
            return Err(ApiDocError::Post(if detail.is_empty() {
                format!("{url}: HTTP {status}")
            } else {
                format!("{url}: HTTP {status}: {detail}")
            }));
        }

        debug!(%url, "edit accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture() -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/json/document.fixture.json");
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    #[test]
    fn endpoint_encodes_segments() {
        let store = HttpDocumentStore::new("https://store.example.com/v1/", 5).unwrap();
        let url = store
            .endpoint(&["projects", "Core", "headers", "math.h", "entities", "operator()"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://store.example.com/v1/projects/Core/headers/math.h/entities/operator%28%29"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = HttpDocumentStore::new("not a url", 5).unwrap_err();
        assert!(err.to_string().contains("invalid store URL"));
    }

    #[tokio::test]
    async fn fetch_document_from_mock_server() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(url_path("/document"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture()))
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        let document = store.fetch_document().await.unwrap();
        assert_eq!(document.projects.len(), 2);
        assert_eq!(document.projects[1].name, "Graphics");
    }

    #[tokio::test]
    async fn fetch_failure_on_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(url_path("/document"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        let err = store.fetch_document().await.unwrap_err();
        assert!(matches!(err, ApiDocError::Fetch(_)));
        assert!(err.to_string().contains("503"));
        // `expect(1)` is verified on drop: no retry happened
    }

    #[tokio::test]
    async fn malformed_document_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(url_path("/document"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{ \"projects\": 7 }"))
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        let err = store.fetch_document().await.unwrap_err();
        assert!(matches!(err, ApiDocError::Parse { .. }));
    }

    #[tokio::test]
    async fn post_entity_sends_partial_update() {
        let server = MockServer::start().await;
        let patch = serde_json::json!({ "briefDescription": "Updated." });

        Mock::given(method("POST"))
            .and(url_path("/projects/Core/headers/math.h/entities/vec2"))
            .and(body_json(&patch))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        store.post_entity("Core", "math.h", "vec2", &patch).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_post_is_a_save_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(url_path("/projects/Core/headers/math.h"))
            .respond_with(ResponseTemplate::new(409).set_body_string("stale revision"))
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        let patch = serde_json::json!({ "descriptions": ["New."] });
        let err = store.post_header("Core", "math.h", &patch).await.unwrap_err();
        assert!(matches!(err, ApiDocError::Post(_)));
        assert!(err.to_string().contains("stale revision"));
    }
}
