//! Static route enumeration.
//!
//! Every entity at every depth gets exactly one [`RouteTuple`]; project and
//! header index pages get an [`IndexRoute`]. Order is document order.

use std::collections::HashSet;

use apidoc_shared::{SegmentEncoding, path};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{API_ROOT, EntityGraph};

/// Address of one entity page: top-level entity plus the member chain below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RouteTuple {
    pub project: String,
    pub header: String,
    pub entity: String,
    pub member_chain: Vec<String>,
}

impl RouteTuple {
    /// All segments after the API root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        [
            self.project.as_str(),
            self.header.as_str(),
            self.entity.as_str(),
        ]
        .into_iter()
        .chain(self.member_chain.iter().map(String::as_str))
    }

    /// `/api/<project>/<header>/<entity>[/<member>]*/`
    pub fn path(&self) -> String {
        format!("{API_ROOT}/{}/", self.segments().collect::<Vec<_>>().join("/"))
    }
}

/// Address of a project or header index page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IndexRoute {
    Project { project: String },
    Header { project: String, header: String },
}

impl IndexRoute {
    pub fn path(&self) -> String {
        match self {
            Self::Project { project } => format!("{API_ROOT}/{project}/"),
            Self::Header { project, header } => format!("{API_ROOT}/{project}/{header}/"),
        }
    }
}

/// Enumerate the page route of every entity and nested member.
///
/// Segments are written in `mode`; with [`SegmentEncoding::Passthrough`]
/// they are raw names and cannot be decoded back.
#[instrument(skip_all, fields(mode = ?mode))]
pub fn enumerate_routes(graph: &EntityGraph, mode: SegmentEncoding) -> Vec<RouteTuple> {
    let mut seen = HashSet::new();
    let mut routes = Vec::with_capacity(graph.entities().len());

    // arena order is document pre-order, so a flat pass is already stable
    for node in graph.entities() {
        let project = &graph.project_node(node.project).name;
        let header = &graph.header_node(node.header).name;

        let mut names = graph.owner_names(node.id);
        names.push(node.data.name.as_str());
        let entity = names.remove(0);

        let route = RouteTuple {
            project: path::encode_segment(project, mode),
            header: path::encode_segment(header, mode),
            entity: path::encode_segment(entity, mode),
            member_chain: names
                .into_iter()
                .map(|name| path::encode_segment(name, mode))
                .collect(),
        };

        if seen.insert(route.clone()) {
            routes.push(route);
        } else {
            debug!(path = %route.path(), "duplicate route skipped");
        }
    }

    debug!(count = routes.len(), "routes enumerated");
    routes
}

/// Enumerate project and header index routes, each project before its headers.
pub fn enumerate_index_routes(graph: &EntityGraph, mode: SegmentEncoding) -> Vec<IndexRoute> {
    let mut routes = Vec::new();

    for project in graph.projects() {
        let project_segment = path::encode_segment(&project.name, mode);
        routes.push(IndexRoute::Project {
            project: project_segment.clone(),
        });
        for &header_id in &project.headers {
            routes.push(IndexRoute::Header {
                project: project_segment.clone(),
                header: path::encode_segment(&graph.header_node(header_id).name, mode),
            });
        }
    }

    routes
}
