//! Editor writes: load a partial update from disk and post it to the store.
//!
//! The patch file is only read. When the store rejects an edit the file is
//! left as it was so the change can be retried.

use std::path::Path;

use apidoc_shared::{ApiDocError, Result};
use apidoc_store::{DocumentStore, EditTarget};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Read a JSON patch. Only objects are accepted.
pub fn load_patch(path: &Path) -> Result<Value> {
    let json = std::fs::read_to_string(path).map_err(|e| ApiDocError::io(path, e))?;
    let patch: Value = serde_json::from_str(&json)
        .map_err(|e| ApiDocError::parse(format!("invalid patch {}: {e}", path.display())))?;

    match patch {
        Value::Object(ref fields) if !fields.is_empty() => Ok(patch),
        Value::Object(_) => Err(ApiDocError::validation(format!(
            "patch {} has no fields",
            path.display()
        ))),
        _ => Err(ApiDocError::validation(format!(
            "patch {} must be a JSON object",
            path.display()
        ))),
    }
}

/// Post `patch` for `target`. No retry.
#[instrument(skip_all, fields(edit = %target))]
pub async fn submit_edit<S: DocumentStore>(
    store: &S,
    target: &EditTarget,
    patch: &Value,
) -> Result<()> {
    match store.post(target, patch).await {
        Ok(()) => {
            info!("edit saved");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "edit not saved");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use apidoc_store::{FileDocumentStore, HttpDocumentStore};
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("apidoc-edit-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn target() -> EditTarget {
        EditTarget::Entity {
            project: "Core".into(),
            header: "math.h".into(),
            entity: "vec2".into(),
        }
    }

    #[test]
    fn load_patch_accepts_objects() {
        let dir = temp_dir();
        let file = dir.join("patch.json");
        std::fs::write(&file, r#"{ "briefDescription": "New." }"#).unwrap();

        let patch = load_patch(&file).unwrap();
        assert_eq!(patch["briefDescription"], "New.");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_patch_rejects_non_objects() {
        let dir = temp_dir();

        let file = dir.join("array.json");
        std::fs::write(&file, "[1, 2]").unwrap();
        assert!(matches!(
            load_patch(&file).unwrap_err(),
            ApiDocError::Validation { .. }
        ));

        let file = dir.join("empty.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(load_patch(&file).unwrap_err().to_string().contains("no fields"));

        let file = dir.join("broken.json");
        std::fs::write(&file, "{ nope").unwrap();
        assert!(matches!(
            load_patch(&file).unwrap_err(),
            ApiDocError::Parse { .. }
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rejected_edit_leaves_patch_file_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/projects/Core/headers/math.h/entities/vec2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let file = dir.join("patch.json");
        let original = r#"{ "briefDescription": "Unsaved work." }"#;
        std::fs::write(&file, original).unwrap();

        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        let patch = load_patch(&file).unwrap();
        let err = submit_edit(&store, &target(), &patch).await.unwrap_err();

        assert!(matches!(err, ApiDocError::Post(_)));
        assert!(err.to_string().starts_with("save failed"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), original);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn accepted_edit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/projects/Core"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        let target = EditTarget::Project {
            project: "Core".into(),
        };
        let patch = serde_json::json!({ "briefDescription": "Core types." });
        submit_edit(&store, &target, &patch).await.unwrap();
    }

    #[tokio::test]
    async fn file_store_refuses_edits() {
        let store = FileDocumentStore::new("document.json");
        let patch = serde_json::json!({ "briefDescription": "x" });
        let err = submit_edit(&store, &target(), &patch).await.unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }
}
