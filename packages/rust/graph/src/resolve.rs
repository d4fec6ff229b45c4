//! Scoped-name resolution.
//!
//! Maps names such as `vec2::length` or `std::vector` to a browsable path
//! inside the documentation, or to an external search URL for the
//! standard library.

use apidoc_markup::LinkResolver;
use apidoc_shared::{LinksConfig, path};
use tracing::debug;

use crate::EntityGraph;

/// Root of every internal documentation path.
pub const API_ROOT: &str = "/api";

/// Scope separator in qualified names.
const SCOPE: &str = "::";

/// Reserved root name routed to the external search.
const STD_ROOT: &str = "std";

/// Outcome of resolving a scoped name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Internal path, every segment percent-encoded.
    Path(String),
    /// External search URL for a standard-library name.
    External(String),
    /// Nothing matched; render as plain text.
    Unresolved,
}

impl Resolution {
    /// The link target, if any.
    pub fn into_link(self) -> Option<String> {
        match self {
            Self::Path(link) | Self::External(link) => Some(link),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// Resolves scoped names against a decorated graph.
#[derive(Debug, Clone)]
pub struct NameResolver<'g> {
    graph: &'g EntityGraph,
    std_search_url: String,
}

impl<'g> NameResolver<'g> {
    /// Create a resolver; `std_search_url` is the prefix `std::` remainders are appended to.
    pub fn new(graph: &'g EntityGraph, std_search_url: impl Into<String>) -> Self {
        Self {
            graph,
            std_search_url: std_search_url.into(),
        }
    }

    /// Create a resolver from the `[links]` config section.
    pub fn from_config(graph: &'g EntityGraph, links: &LinksConfig) -> Self {
        Self::new(graph, links.std_search_url.clone())
    }

    /// Resolve `name`.
    ///
    /// The part before the first `::` is the root name; it is matched
    /// against projects, then headers, then top-level entities, first match
    /// wins. Only entity matches keep the member path after the root.
    pub fn resolve(&self, name: &str) -> Resolution {
        let (root, members) = match name.split_once(SCOPE) {
            Some((root, rest)) => (root, Some(rest)),
            None => (name, None),
        };

        if let (STD_ROOT, Some(rest)) = (root, members) {
            return Resolution::External(format!("{}{rest}", self.std_search_url));
        }

        if let Some(project) = self.graph.projects().iter().find(|p| p.name == root) {
            return Resolution::Path(format!("{API_ROOT}/{}/", path::encode(&project.name)));
        }

        if let Some(header) = self.graph.find_header(root) {
            let project = self.graph.project_node(header.project);
            return Resolution::Path(format!(
                "{API_ROOT}/{}/{}/",
                path::encode(&project.name),
                path::encode(&header.name)
            ));
        }

        if let Some(entity) = self.graph.find_entity(root) {
            let project = self.graph.project_node(entity.project);
            let header = self.graph.header_node(entity.header);
            let member_path = members
                .map(|rest| path::join_segments(rest.split(SCOPE)))
                .unwrap_or_default();
            return Resolution::Path(format!(
                "{API_ROOT}/{}/{}/{}/{member_path}",
                path::encode(&project.name),
                path::encode(&header.name),
                path::encode(&entity.data.name)
            ));
        }

        debug!(name, "unresolved name");
        Resolution::Unresolved
    }
}

impl LinkResolver for NameResolver<'_> {
    fn link_for(&self, target: &str) -> Option<String> {
        self.resolve(target).into_link()
    }
}
