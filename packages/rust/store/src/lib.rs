//! Document store client.
//!
//! The document store owns the JSON documentation tree. apidoc only reads
//! the whole document and posts partial updates; the store merges and
//! validates them. Every call is single-shot: failures are returned to the
//! caller and never retried here.

mod file;
mod http;

use apidoc_shared::{ApiDocError, Document, Result, StoreConfig};
use serde_json::Value;

pub use file::FileDocumentStore;
pub use http::HttpDocumentStore;

// ---------------------------------------------------------------------------
// EditTarget
// ---------------------------------------------------------------------------

/// What a partial update applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Project {
        project: String,
    },
    Header {
        project: String,
        header: String,
    },
    Entity {
        project: String,
        header: String,
        entity: String,
    },
}

impl EditTarget {
    /// Store path segments (unencoded) addressing this target.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::Project { project } => vec!["projects", project],
            Self::Header { project, header } => vec!["projects", project, "headers", header],
            Self::Entity {
                project,
                header,
                entity,
            } => vec![
                "projects", project, "headers", header, "entities", entity,
            ],
        }
    }
}

impl std::fmt::Display for EditTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project { project } => write!(f, "project {project}"),
            Self::Header { project, header } => write!(f, "header {project}/{header}"),
            Self::Entity {
                project,
                header,
                entity,
            } => write!(f, "entity {project}/{header}/{entity}"),
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Read the whole document; post partial edits.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Fetch the raw, undecorated document.
    async fn fetch_document(&self) -> Result<Document>;

    /// Send a partial update for `target`. The store owns the merge.
    async fn post(&self, target: &EditTarget, patch: &Value) -> Result<()>;

    async fn post_project(&self, project: &str, patch: &Value) -> Result<()> {
        let target = EditTarget::Project {
            project: project.to_string(),
        };
        self.post(&target, patch).await
    }

    async fn post_header(&self, project: &str, header: &str, patch: &Value) -> Result<()> {
        let target = EditTarget::Header {
            project: project.to_string(),
            header: header.to_string(),
        };
        self.post(&target, patch).await
    }

    async fn post_entity(
        &self,
        project: &str,
        header: &str,
        entity: &str,
        patch: &Value,
    ) -> Result<()> {
        let target = EditTarget::Entity {
            project: project.to_string(),
            header: header.to_string(),
            entity: entity.to_string(),
        };
        self.post(&target, patch).await
    }
}

// ---------------------------------------------------------------------------
// Store selection
// ---------------------------------------------------------------------------

/// The store selected by configuration.
#[derive(Debug)]
pub enum Store {
    Http(HttpDocumentStore),
    File(FileDocumentStore),
}

impl Store {
    /// A local `document_path` wins over an HTTP `url`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        if let Some(path) = &config.document_path {
            return Ok(Self::File(FileDocumentStore::new(path)));
        }
        if let Some(url) = &config.url {
            return Ok(Self::Http(HttpDocumentStore::new(url, config.timeout_secs)?));
        }
        Err(ApiDocError::config(
            "no document store configured: set [store].url or [store].document_path",
        ))
    }
}

impl DocumentStore for Store {
    async fn fetch_document(&self) -> Result<Document> {
        match self {
            Self::Http(store) => store.fetch_document().await,
            Self::File(store) => store.fetch_document().await,
        }
    }

    async fn post(&self, target: &EditTarget, patch: &Value) -> Result<()> {
        match self {
            Self::Http(store) => store.post(target, patch).await,
            Self::File(store) => store.post(target, patch).await,
        }
    }
}
