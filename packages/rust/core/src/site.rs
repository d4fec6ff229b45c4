//! Static site build: fetch → decorate → enumerate → render → write.
//!
//! Output layout:
//! ```text
//! <output_dir>/
//! ├── manifest.json
//! ├── routes.json
//! └── api/
//!     ├── Core/index.md
//!     ├── Core/math.h/index.md
//!     ├── Core/math.h/vec2/index.md
//!     └── Core/math.h/vec2/length/index.md
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use apidoc_graph::{
    EntityGraph, IndexRoute, RouteTuple, enumerate_index_routes, enumerate_routes,
};
use apidoc_shared::{
    ApiDocError, AppConfig, Document, LinksConfig, Result, SegmentEncoding,
};
use apidoc_store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::page::{self, IndexPage, Page, PageRenderer};

/// Top-level directory every page is written under.
const API_DIR: &str = "api";

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Options for one site build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory the site is written to.
    pub output_dir: PathBuf,
    /// Route segment encoding.
    pub encoding: SegmentEncoding,
    /// Cross-reference link settings.
    pub links: LinksConfig,
    /// Tool version string.
    pub tool_version: String,
}

impl BuildOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.site.output_dir),
            encoding: config.routes.encoding(),
            links: config.links.clone(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Written to `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteManifest {
    pub build_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    /// SHA-256 of the fetched document, re-serialized.
    pub document_sha256: String,
    pub project_count: usize,
    pub header_count: usize,
    pub entity_count: usize,
    pub page_count: usize,
    pub unresolved_references: usize,
}

/// Written to `routes.json`.
#[derive(Debug, Serialize)]
struct RoutesFile<'a> {
    index_routes: &'a [IndexRoute],
    routes: &'a [RouteTuple],
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    pub manifest: SiteManifest,
    pub elapsed: Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page is written.
    fn page_written(&self, path: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_written(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Fetch the document once and write the whole site.
///
/// A fetch failure aborts the build before anything is written.
#[instrument(skip_all, fields(output = %options.output_dir.display()))]
pub async fn build_site<S: DocumentStore>(
    store: &S,
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    progress.phase("Fetching document");
    let document = store.fetch_document().await?;

    let mut result = write_site(document, options, progress)?;
    result.elapsed = start.elapsed();

    info!(
        pages = result.manifest.page_count,
        unresolved = result.manifest.unresolved_references,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "site build complete"
    );
    progress.done(&result);
    Ok(result)
}

/// Write the site for an already fetched document.
pub fn write_site(
    document: Document,
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    let document_sha256 = document_digest(&document)?;

    progress.phase("Decorating document");
    let graph = EntityGraph::load(document);

    progress.phase("Enumerating routes");
    let index_routes = enumerate_index_routes(&graph, options.encoding);
    let routes = enumerate_routes(&graph, options.encoding);
    let total = index_routes.len() + routes.len();

    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| ApiDocError::io(&options.output_dir, e))?;

    progress.phase("Writing pages");
    let renderer = PageRenderer::new(&graph, &options.links);
    let mut written = 0;
    let mut unresolved = 0;

    for route in &index_routes {
        let page = match page::lookup_index(&graph, route, options.encoding)? {
            IndexPage::Project(id) => renderer.render_project_page(id),
            IndexPage::Header(id) => renderer.render_header_page(id),
        };
        let segments: Vec<&str> = match route {
            IndexRoute::Project { project } => vec![project.as_str()],
            IndexRoute::Header { project, header } => vec![project.as_str(), header.as_str()],
        };
        unresolved += emit(options, &segments, &page)?;
        written += 1;
        progress.page_written(&route.path(), written, total);
    }

    for route in &routes {
        let node = page::lookup_route(&graph, route, options.encoding)?;
        let page = renderer.render_entity_page(node.id);
        let segments: Vec<&str> = route.segments().collect();
        unresolved += emit(options, &segments, &page)?;
        written += 1;
        progress.page_written(&route.path(), written, total);
    }

    write_json(
        &options.output_dir.join("routes.json"),
        &RoutesFile {
            index_routes: &index_routes,
            routes: &routes,
        },
    )?;

    let manifest = SiteManifest {
        build_id: Uuid::now_v7(),
        generated_at: Utc::now(),
        tool_version: options.tool_version.clone(),
        document_sha256,
        project_count: graph.projects().len(),
        header_count: graph.headers().len(),
        entity_count: graph.entities().len(),
        page_count: written,
        unresolved_references: unresolved,
    };
    write_json(&options.output_dir.join("manifest.json"), &manifest)?;

    Ok(BuildResult {
        output_dir: options.output_dir.clone(),
        manifest,
        elapsed: start.elapsed(),
    })
}

/// Write one page and log its unresolved references. Returns their count.
fn emit(options: &BuildOptions, segments: &[&str], page: &Page) -> Result<usize> {
    let file_path = page_file(&options.output_dir, segments, options.encoding)?;
    for target in &page.unresolved {
        warn!(page = %page.title, reference = %target, "unresolved reference");
    }
    write_page(&file_path, &page.markdown)?;
    Ok(page.unresolved.len())
}

/// `<output_dir>/api/<segments...>/index.md`
///
/// Escaped segments are decoded first, so the file sits where a static
/// server looks for the page's link. A decoded name holding a path
/// separator keeps its escaped form. Segments that would leave their
/// directory are rejected.
fn page_file(output_dir: &Path, segments: &[&str], mode: SegmentEncoding) -> Result<PathBuf> {
    let mut file_path = output_dir.join(API_DIR);
    for &segment in segments {
        let decoded = page::decode_segment(segment, mode)?;
        let name = if decoded.contains(SEPARATORS) { segment } else { decoded.as_str() };
        if name.is_empty() || name == "." || name == ".." || name.contains(SEPARATORS) {
            return Err(ApiDocError::validation(format!(
                "route segment '{segment}' cannot be written as a directory"
            )));
        }
        file_path.push(name);
    }
    file_path.push("index.md");
    Ok(file_path)
}

fn document_digest(document: &Document) -> Result<String> {
    let bytes = serde_json::to_vec(document)
        .map_err(|e| ApiDocError::validation(format!("JSON serialization failed: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write a JSON file (pretty-printed).
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| ApiDocError::validation(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json).map_err(|e| ApiDocError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write a page, creating parent directories.
fn write_page(file_path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ApiDocError::io(parent, e))?;
    }
    std::fs::write(file_path, markdown).map_err(|e| ApiDocError::io(file_path, e))?;
    debug!(path = %file_path.display(), "wrote page");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use apidoc_store::{FileDocumentStore, HttpDocumentStore};
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("apidoc-site-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/json/document.fixture.json")
    }

    fn options(output_dir: &Path) -> BuildOptions {
        BuildOptions {
            output_dir: output_dir.into(),
            encoding: SegmentEncoding::Escaped,
            links: LinksConfig::default(),
            tool_version: "0.1.0-test".into(),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        pages: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn page_written(&self, path: &str, _current: usize, _total: usize) {
            self.pages.lock().unwrap().push(path.to_string());
        }
        fn done(&self, _result: &BuildResult) {}
    }

    #[tokio::test]
    async fn build_writes_every_page() {
        let out = temp_dir();
        let store = FileDocumentStore::new(fixture_path());
        let progress = RecordingProgress::default();

        let result = build_site(&store, &options(&out), &progress).await.unwrap();

        for page in [
            "api/Core/index.md",
            "api/Core/math.h/index.md",
            "api/Core/color.h/index.md",
            "api/Graphics/window.h/index.md",
            "api/Core/math.h/vec2/index.md",
            "api/Core/math.h/vec2/iterator/next/index.md",
            "api/Graphics/window.h/window/length/index.md",
        ] {
            assert!(out.join(page).is_file(), "{page} missing");
        }

        let manifest = &result.manifest;
        assert_eq!(manifest.project_count, 2);
        assert_eq!(manifest.header_count, 3);
        assert_eq!(manifest.entity_count, 9);
        assert_eq!(manifest.page_count, 14);
        assert_eq!(manifest.document_sha256.len(), 64);
        assert!(manifest.unresolved_references >= 1);

        let pages = progress.pages.lock().unwrap();
        assert_eq!(pages.len(), 14);
        assert_eq!(pages[0], "/api/Core/");
        assert_eq!(progress.phases.lock().unwrap()[0], "Fetching document");

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn build_writes_manifest_and_routes() {
        let out = temp_dir();
        let store = FileDocumentStore::new(fixture_path());
        let result = build_site(&store, &options(&out), &SilentProgress).await.unwrap();

        let json = std::fs::read_to_string(out.join("manifest.json")).unwrap();
        let manifest: SiteManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest, result.manifest);

        let json = std::fs::read_to_string(out.join("routes.json")).unwrap();
        let routes: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(routes["routes"].as_array().unwrap().len(), 9);
        assert_eq!(routes["index_routes"].as_array().unwrap().len(), 5);
        assert_eq!(routes["routes"][4]["member_chain"][1], "next");
        assert_eq!(routes["index_routes"][1]["kind"], "header");

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn same_document_has_same_digest() {
        let store = FileDocumentStore::new(fixture_path());
        let first = temp_dir();
        let second = temp_dir();

        let a = build_site(&store, &options(&first), &SilentProgress).await.unwrap();
        let b = build_site(&store, &options(&second), &SilentProgress).await.unwrap();
        assert_eq!(a.manifest.document_sha256, b.manifest.document_sha256);
        assert_ne!(a.manifest.build_id, b.manifest.build_id);

        let _ = std::fs::remove_dir_all(&first);
        let _ = std::fs::remove_dir_all(&second);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_build() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/document"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let out = temp_dir().join("site");
        let store = HttpDocumentStore::new(&server.uri(), 5).unwrap();
        let err = build_site(&store, &options(&out), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiDocError::Fetch(_)));
        assert!(!out.exists());
    }

    #[test]
    fn empty_document_writes_only_indexes() {
        let out = temp_dir();
        let result = write_site(Document::default(), &options(&out), &SilentProgress).unwrap();
        assert_eq!(result.manifest.page_count, 0);
        assert!(out.join("manifest.json").is_file());
        assert!(!out.join(API_DIR).exists());

        let _ = std::fs::remove_dir_all(&out);
    }

    #[test]
    fn segments_cannot_escape_output_dir() {
        let out = Path::new("/tmp/site");
        let raw = SegmentEncoding::Passthrough;
        assert!(page_file(out, &["Core", "..", "etc"], raw).is_err());
        assert!(page_file(out, &["Core", "math.h", "operator/"], raw).is_err());
        assert_eq!(
            page_file(out, &["Core", "math.h", "vec2"], raw).unwrap(),
            Path::new("/tmp/site/api/Core/math.h/vec2/index.md")
        );

        let escaped = SegmentEncoding::Escaped;
        assert!(page_file(out, &["Core", "%2E%2E", "etc"], escaped).is_err());
        assert!(page_file(out, &["Core", "math.h", "%FF"], escaped).is_err());
        assert_eq!(
            page_file(out, &["Core", "math.h", "operator%2F"], escaped).unwrap(),
            Path::new("/tmp/site/api/Core/math.h/operator%2F/index.md")
        );
    }

    #[test]
    fn escaped_segments_are_decoded_on_disk() {
        let out = Path::new("/tmp/site");
        assert_eq!(
            page_file(out, &["Core", "math.h", "operator%28%29"], SegmentEncoding::Escaped).unwrap(),
            Path::new("/tmp/site/api/Core/math.h/operator()/index.md")
        );
    }

    #[test]
    fn escaped_build_writes_pages_where_links_point() {
        let out = temp_dir();
        let json = std::fs::read_to_string(fixture_path()).unwrap();
        let mut document = Document::from_json(&json).unwrap();
        document.projects[0].headers[0].entities[1].data.name = "operator()".into();

        write_site(document, &options(&out), &SilentProgress).unwrap();

        let header_page = std::fs::read_to_string(out.join("api/Core/math.h/index.md")).unwrap();
        let link = "/api/Core/math.h/operator%28%29/";
        assert!(header_page.contains(link), "{header_page}");

        let on_disk = apidoc_shared::path::decode(link.trim_start_matches('/')).unwrap();
        assert!(out.join(on_disk).join("index.md").is_file());
        assert!(!out.join("api/Core/math.h/operator%28%29").exists());

        let _ = std::fs::remove_dir_all(&out);
    }

    #[test]
    fn passthrough_build_uses_raw_segments() {
        let out = temp_dir();
        let json = std::fs::read_to_string(fixture_path()).unwrap();
        let mut document = Document::from_json(&json).unwrap();
        document.projects[0].headers[0].entities[1].data.name = "operator()".into();

        let mut opts = options(&out);
        opts.encoding = SegmentEncoding::Passthrough;
        write_site(document, &opts, &SilentProgress).unwrap();

        assert!(out.join("api/Core/math.h/operator()/index.md").is_file());

        let _ = std::fs::remove_dir_all(&out);
    }
}
