//! Read-only store backed by a local JSON document.

use std::path::{Path, PathBuf};

use apidoc_shared::{ApiDocError, Document, Result};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{DocumentStore, EditTarget};

/// Serves a document exported to disk. Edits are rejected.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    path: PathBuf,
}

impl FileDocumentStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileDocumentStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn fetch_document(&self) -> Result<Document> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ApiDocError::Fetch(format!("{}: {e}", self.path.display())))?;

        let document = Document::from_json(&body)?;
        info!(projects = document.projects.len(), bytes = body.len(), "document loaded");
        Ok(document)
    }

    async fn post(&self, target: &EditTarget, _patch: &Value) -> Result<()> {
        warn!(edit = %target, path = %self.path.display(), "edit rejected by file store");
        Err(ApiDocError::Post(format!(
            "{target}: document file {} is read-only",
            self.path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/json/document.fixture.json")
    }

    #[tokio::test]
    async fn loads_fixture_document() {
        let store = FileDocumentStore::new(fixture_path());
        let document = store.fetch_document().await.unwrap();
        assert_eq!(document.projects[0].name, "Core");
        assert_eq!(document.projects[0].headers[0].name, "math.h");
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_failure() {
        let store = FileDocumentStore::new("/nonexistent/apidoc/document.json");
        let err = store.fetch_document().await.unwrap_err();
        assert!(matches!(err, ApiDocError::Fetch(_)));
    }

    #[tokio::test]
    async fn posts_are_rejected() {
        let store = FileDocumentStore::new(fixture_path());
        let patch = serde_json::json!({ "briefDescription": "x" });
        let err = store.post_project("Core", &patch).await.unwrap_err();
        assert!(matches!(err, ApiDocError::Post(_)));
        assert!(err.to_string().contains("read-only"));
    }
}
