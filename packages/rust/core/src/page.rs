//! Markdown pages for projects, headers, and entities.
//!
//! Every description runs through the markup pipeline; references are
//! linked through [`NameResolver`]. Targets that do not resolve are
//! rendered as plain text and reported on the [`Page`].

use std::cell::RefCell;

use apidoc_graph::{
    API_ROOT, EntityGraph, EntityId, EntityNode, HeaderId, IndexRoute, NameResolver, ProjectId,
    RouteTuple,
};
use apidoc_markup::LinkResolver;
use apidoc_shared::{LinksConfig, Result, SegmentEncoding, path};
use tracing::{debug, instrument};

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub title: String,
    /// Markdown with frontmatter.
    pub markdown: String,
    /// Reference targets that did not resolve, in order of appearance.
    pub unresolved: Vec<String>,
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// `/api/<project>/`
pub fn project_link(graph: &EntityGraph, id: ProjectId) -> String {
    format!("{API_ROOT}/{}/", path::encode(&graph.project_node(id).name))
}

/// `/api/<project>/<header>/`
pub fn header_link(graph: &EntityGraph, id: HeaderId) -> String {
    let header = graph.header_node(id);
    let project = graph.project_node(header.project);
    format!(
        "{API_ROOT}/{}/",
        path::join_segments([project.name.as_str(), header.name.as_str()])
    )
}

/// `/api/<project>/<header>/<entity>[/<member>]*/`
pub fn entity_link(graph: &EntityGraph, id: EntityId) -> String {
    let node = graph.entity_node(id);
    let project = &graph.project_node(node.project).name;
    let header = &graph.header_node(node.header).name;
    let segments = [project.as_str(), header.as_str()]
        .into_iter()
        .chain(graph.owner_names(id))
        .chain([node.data.name.as_str()]);
    format!("{API_ROOT}/{}/", path::join_segments(segments))
}

// ---------------------------------------------------------------------------
// Route lookups
// ---------------------------------------------------------------------------

/// The page an index route addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPage {
    Project(ProjectId),
    Header(HeaderId),
}

pub(crate) fn decode_segment(segment: &str, mode: SegmentEncoding) -> Result<String> {
    match mode {
        SegmentEncoding::Escaped => path::decode(segment),
        SegmentEncoding::Passthrough => Ok(segment.to_string()),
    }
}

/// Find the entity a route addresses.
pub fn lookup_route<'g>(
    graph: &'g EntityGraph,
    route: &RouteTuple,
    mode: SegmentEncoding,
) -> Result<&'g EntityNode> {
    let project = decode_segment(&route.project, mode)?;
    let header = decode_segment(&route.header, mode)?;
    let entity = decode_segment(&route.entity, mode)?;
    let chain = route
        .member_chain
        .iter()
        .map(|segment| decode_segment(segment, mode))
        .collect::<Result<Vec<_>>>()?;

    graph.member(&project, &header, &entity, &chain)
}

/// Find the project or header an index route addresses.
pub fn lookup_index(
    graph: &EntityGraph,
    route: &IndexRoute,
    mode: SegmentEncoding,
) -> Result<IndexPage> {
    match route {
        IndexRoute::Project { project } => {
            let project = decode_segment(project, mode)?;
            Ok(IndexPage::Project(graph.project(&project)?.id))
        }
        IndexRoute::Header { project, header } => {
            let project = decode_segment(project, mode)?;
            let header = decode_segment(header, mode)?;
            Ok(IndexPage::Header(graph.header(&project, &header)?.id))
        }
    }
}

// ---------------------------------------------------------------------------
// PageRenderer
// ---------------------------------------------------------------------------

/// Renders pages for one decorated graph.
#[derive(Debug, Clone)]
pub struct PageRenderer<'g> {
    graph: &'g EntityGraph,
    resolver: NameResolver<'g>,
}

impl<'g> PageRenderer<'g> {
    pub fn new(graph: &'g EntityGraph, links: &LinksConfig) -> Self {
        Self {
            graph,
            resolver: NameResolver::from_config(graph, links),
        }
    }

    pub fn resolver(&self) -> &NameResolver<'g> {
        &self.resolver
    }

    #[instrument(skip(self))]
    pub fn render_project_page(&self, id: ProjectId) -> Page {
        let project = self.graph.project_node(id);
        let mut page = PageWriter::new(&self.resolver);

        page.heading(1, &project.name);
        page.prose(&project.brief_description);
        for paragraph in &project.detailed_description {
            page.prose(paragraph);
        }

        if !project.headers.is_empty() {
            page.heading(2, "Headers");
            let items: Vec<String> = project
                .headers
                .iter()
                .map(|&header_id| {
                    let header = self.graph.header_node(header_id);
                    format!("- [{}]({})", header.name, header_link(self.graph, header_id))
                })
                .collect();
            page.block(&items.join("\n"));
        }

        page.finish(&project.name, &[("kind", "project")])
    }

    #[instrument(skip(self))]
    pub fn render_header_page(&self, id: HeaderId) -> Page {
        let graph = self.graph;
        let header = graph.header_node(id);
        let project = graph.project_node(header.project);
        let mut page = PageWriter::new(&self.resolver);

        page.block(&format!(
            "[{}]({}) / {}",
            project.name,
            project_link(graph, project.id),
            header.name
        ));
        page.heading(1, &header.name);
        for description in &header.descriptions {
            page.prose(description);
        }

        if !header.entities.is_empty() {
            page.heading(2, "Entities");
            let items: Vec<String> = header
                .entities
                .iter()
                .map(|&entity_id| page.member_item(graph, graph.entity_node(entity_id)))
                .collect();
            page.block(&items.join("\n"));
        }

        page.finish(
            &header.name,
            &[("kind", "header"), ("project", project.name.as_str())],
        )
    }

    #[instrument(skip(self))]
    pub fn render_entity_page(&self, id: EntityId) -> Page {
        let graph = self.graph;
        let node = graph.entity_node(id);
        let data = &node.data;
        let project = graph.project_node(node.project);
        let header = graph.header_node(node.header);
        let mut page = PageWriter::new(&self.resolver);

        let mut qualified: Vec<&str> = graph.owner_names(id);
        qualified.push(&data.name);
        let title = qualified.join("::");

        let mut crumbs = vec![
            format!("[{}]({})", project.name, project_link(graph, project.id)),
            format!("[{}]({})", header.name, header_link(graph, header.id)),
        ];
        for &owner in &node.owners {
            let owner_node = graph.entity_node(owner);
            crumbs.push(format!(
                "[{}]({})",
                owner_node.data.name,
                entity_link(graph, owner)
            ));
        }
        crumbs.push(data.name.clone());
        page.block(&crumbs.join(" / "));

        page.heading(1, &title);
        page.block(&format!("*{}*", data.kind));
        page.code(&data.declaration);
        page.prose(&data.brief_description);
        for warning in &data.warnings {
            let text = page.inline(warning);
            page.block(&format!("> **Warning:** {text}"));
        }
        for paragraph in &data.detailed_description {
            page.prose(paragraph);
        }

        if !data.base_classes.is_empty() {
            page.heading(2, "Base classes");
            let items: Vec<String> = data
                .base_classes
                .iter()
                .map(|name| format!("- {}", page.name_link(name)))
                .collect();
            page.block(&items.join("\n"));
        }

        if !data.template_parameters.is_empty() {
            page.heading(2, "Template parameters");
            let items: Vec<String> = data
                .template_parameters
                .iter()
                .map(|param| format!("- `{param}`"))
                .collect();
            page.block(&items.join("\n"));
        }

        let traits: Vec<String> = [("Copyable", data.copyable), ("Movable", data.movable)]
            .into_iter()
            .filter_map(|(label, flag)| {
                flag.map(|flag| format!("- {label}: {}", if flag { "yes" } else { "no" }))
            })
            .collect();
        if !traits.is_empty() {
            page.block(&traits.join("\n"));
        }

        if let Some(constructor) = &data.constructor {
            page.heading(2, "Constructor");
            page.prose(&constructor.brief_description);
            for overload in &constructor.overloads {
                page.code(&overload.declaration);
                page.prose(&overload.description);
            }
        }

        if !data.overloads.is_empty() {
            page.heading(2, "Overloads");
            for overload in &data.overloads {
                page.code(&overload.declaration);
                page.prose(&overload.description);
            }
        }

        if !data.exceptions.is_empty() {
            page.heading(2, "Exceptions");
            let items: Vec<String> = data
                .exceptions
                .iter()
                .map(|name| format!("- {}", page.name_link(name)))
                .collect();
            page.block(&items.join("\n"));
        }

        if !data.values.is_empty() {
            page.heading(2, "Values");
            let mut table = String::from("| Name | Description |\n| --- | --- |");
            for value in &data.values {
                let description = page.inline(&value.brief_description).replace('|', "\\|");
                table.push_str(&format!("\n| `{}` | {description} |", value.name));
            }
            page.block(&table);
        }

        if node.groups.iter().any(|group| !group.members.is_empty()) {
            page.heading(2, "Members");
            for group in node.groups.iter().filter(|g| !g.members.is_empty()) {
                if !group.name.is_empty() {
                    page.heading(3, &group.name);
                }
                page.prose(&group.description);
                let items: Vec<String> = group
                    .members
                    .iter()
                    .map(|&member| page.member_item(graph, graph.entity_node(member)))
                    .collect();
                page.block(&items.join("\n"));
            }
        }

        if let Some(example) = &data.example {
            page.heading(2, "Example");
            page.prose(&example.description);
            page.code(&example.code);
        }

        if !data.related.is_empty() {
            page.heading(2, "Related");
            let items: Vec<String> = data
                .related
                .iter()
                .map(|name| format!("- {}", page.name_link(name)))
                .collect();
            page.block(&items.join("\n"));
        }

        page.finish(
            &title,
            &[
                ("kind", data.kind.as_str()),
                ("project", project.name.as_str()),
                ("header", header.name.as_str()),
            ],
        )
    }
}

// ---------------------------------------------------------------------------
// PageWriter
// ---------------------------------------------------------------------------

/// Link resolver that remembers every target it could not link.
struct RecordingLinks<'a> {
    inner: &'a dyn LinkResolver,
    misses: RefCell<Vec<String>>,
}

impl LinkResolver for RecordingLinks<'_> {
    fn link_for(&self, target: &str) -> Option<String> {
        let link = self.inner.link_for(target);
        if link.is_none() {
            self.misses.borrow_mut().push(target.to_string());
        }
        link
    }
}

/// Accumulates Markdown blocks separated by blank lines.
struct PageWriter<'a> {
    links: RecordingLinks<'a>,
    body: String,
}

impl<'a> PageWriter<'a> {
    fn new(resolver: &'a dyn LinkResolver) -> Self {
        Self {
            links: RecordingLinks {
                inner: resolver,
                misses: RefCell::new(Vec::new()),
            },
            body: String::new(),
        }
    }

    fn block(&mut self, text: &str) {
        let text = text.trim_end();
        if text.trim().is_empty() {
            return;
        }
        if !self.body.is_empty() {
            self.body.push_str("\n\n");
        }
        self.body.push_str(text);
    }

    fn heading(&mut self, level: usize, text: &str) {
        self.block(&format!("{} {text}", "#".repeat(level)));
    }

    fn code(&mut self, code: &str) {
        if !code.trim().is_empty() {
            self.block(&format!("```cpp\n{}\n```", code.trim_end()));
        }
    }

    /// Parse and render one description.
    fn inline(&self, text: &str) -> String {
        let nodes = apidoc_markup::parse(text);
        apidoc_markup::render_markdown(&nodes, &self.links)
    }

    fn prose(&mut self, text: &str) {
        let rendered = self.inline(text);
        self.block(&rendered);
    }

    /// A bare name, linked when it resolves.
    fn name_link(&self, name: &str) -> String {
        match self.links.link_for(name) {
            Some(link) => format!("[{name}]({link})"),
            None => name.to_string(),
        }
    }

    /// `- [name](link) (kind): brief`
    fn member_item(&self, graph: &EntityGraph, node: &EntityNode) -> String {
        let mut item = format!(
            "- [{}]({}) ({})",
            node.data.name,
            entity_link(graph, node.id),
            node.data.kind
        );
        let brief = self.inline(&node.data.brief_description);
        if !brief.is_empty() {
            item.push_str(": ");
            item.push_str(&brief);
        }
        item
    }

    fn finish(self, title: &str, fields: &[(&str, &str)]) -> Page {
        let mut markdown = build_frontmatter(title, fields);
        markdown.push('\n');
        markdown.push_str(&self.body);
        markdown.push('\n');

        let unresolved = self.links.misses.into_inner();
        debug!(title, unresolved = unresolved.len(), "page rendered");
        Page {
            title: title.to_string(),
            markdown,
            unresolved,
        }
    }
}

fn build_frontmatter(title: &str, fields: &[(&str, &str)]) -> String {
    let mut fm = String::from("---\n");
    fm.push_str(&format!("title: \"{}\"\n", escape_yaml_string(title)));
    for (key, value) in fields {
        fm.push_str(&format!("{key}: \"{}\"\n", escape_yaml_string(value)));
    }
    fm.push_str("---\n");
    fm
}

fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
