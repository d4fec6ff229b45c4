//! Decorated entity graph, name resolution, and route enumeration.
//!
//! [`EntityGraph::load`] turns a raw [`Document`] into an arena of nodes
//! addressed by [`ProjectId`], [`HeaderId`] and [`EntityId`]. Every node
//! carries its back-references (project, header, owner chain), and the
//! display defaults are applied once, here. The graph is read-only after
//! loading; a new fetch builds a new graph.

mod resolve;
mod routes;

use apidoc_shared::{
    ApiDocError, Document, Entity, EntityData, EntityKind, MemberGroup, Result,
};
use tracing::{debug, info, instrument};

pub use resolve::{API_ROOT, NameResolver, Resolution};
pub use routes::{IndexRoute, RouteTuple, enumerate_index_routes, enumerate_routes};

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Index of a project in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(usize);

/// Index of a header in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderId(usize);

/// Index of an entity in its graph. Ids follow document pre-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A decorated project.
#[derive(Debug, Clone)]
pub struct ProjectNode {
    pub id: ProjectId,
    pub name: String,
    pub brief_description: String,
    pub detailed_description: Vec<String>,
    pub headers: Vec<HeaderId>,
}

/// A decorated header. `descriptions` is never empty.
#[derive(Debug, Clone)]
pub struct HeaderNode {
    pub id: HeaderId,
    pub name: String,
    pub descriptions: Vec<String>,
    pub project: ProjectId,
    /// Top-level entities only.
    pub entities: Vec<EntityId>,
}

/// A decorated entity. `data.detailed_description` is never empty.
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub id: EntityId,
    pub data: EntityData,
    pub project: ProjectId,
    pub header: HeaderId,
    /// Enclosing entities, outermost first. Empty for top-level entities.
    pub owners: Vec<EntityId>,
    pub groups: Vec<GroupNode>,
}

/// A member group of a decorated entity.
#[derive(Debug, Clone)]
pub struct GroupNode {
    pub name: String,
    pub description: String,
    pub members: Vec<EntityId>,
}

// ---------------------------------------------------------------------------
// EntityGraph
// ---------------------------------------------------------------------------

/// The decorated, read-only documentation tree.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    projects: Vec<ProjectNode>,
    headers: Vec<HeaderNode>,
    entities: Vec<EntityNode>,
}

/// An entity waiting to be placed in the arena.
struct Pending {
    entity: Entity,
    owners: Vec<EntityId>,
    /// Parent and group index this entity is a member of.
    slot: Option<(EntityId, usize)>,
}

impl EntityGraph {
    /// Decorate a raw document.
    #[instrument(skip_all, fields(projects = document.projects.len()))]
    pub fn load(document: Document) -> Self {
        let mut graph = Self::default();

        for project in document.projects {
            let project_id = ProjectId(graph.projects.len());
            graph.projects.push(ProjectNode {
                id: project_id,
                name: project.name,
                brief_description: project.brief_description,
                detailed_description: project.detailed_description,
                headers: Vec::with_capacity(project.headers.len()),
            });

            for header in project.headers {
                let header_id = HeaderId(graph.headers.len());
                graph.headers.push(HeaderNode {
                    id: header_id,
                    name: header.name,
                    descriptions: with_placeholder(header.descriptions),
                    project: project_id,
                    entities: Vec::with_capacity(header.entities.len()),
                });
                graph.projects[project_id.0].headers.push(header_id);

                for entity in header.entities {
                    let entity_id = graph.insert_tree(entity, project_id, header_id);
                    graph.headers[header_id.0].entities.push(entity_id);
                }
            }
        }

        info!(
            headers = graph.headers.len(),
            entities = graph.entities.len(),
            "document decorated"
        );
        graph
    }

    /// Place `root` and all of its members, depth-first in document order.
    ///
    /// Uses an explicit stack so arbitrarily deep member trees cannot
    /// overflow the call stack.
    fn insert_tree(&mut self, root: Entity, project: ProjectId, header: HeaderId) -> EntityId {
        let root_id = EntityId(self.entities.len());
        let mut stack = vec![Pending {
            entity: root,
            owners: Vec::new(),
            slot: None,
        }];

        while let Some(Pending {
            entity,
            owners,
            slot,
        }) = stack.pop()
        {
            let id = EntityId(self.entities.len());
            if let Some((parent, group)) = slot {
                self.entities[parent.0].groups[group].members.push(id);
            }

            let Entity {
                mut data,
                mut member_groups,
            } = entity;
            data.detailed_description = with_placeholder(data.detailed_description);
            normalize_member_groups(data.kind, &mut member_groups);

            let mut child_owners = owners.clone();
            child_owners.push(id);

            let mut groups = Vec::with_capacity(member_groups.len());
            let mut children = Vec::new();
            for (index, group) in member_groups.into_iter().enumerate() {
                groups.push(GroupNode {
                    name: group.name,
                    description: group.description,
                    members: Vec::with_capacity(group.items.len()),
                });
                children.extend(group.items.into_iter().map(|item| Pending {
                    entity: item,
                    owners: child_owners.clone(),
                    slot: Some((id, index)),
                }));
            }

            debug!(name = %data.name, depth = owners.len(), "decorated entity");
            self.entities.push(EntityNode {
                id,
                data,
                project,
                header,
                owners,
                groups,
            });

            // reversed so the first member is placed next
            stack.extend(children.into_iter().rev());
        }

        root_id
    }

    // -----------------------------------------------------------------------
    // Arena access
    // -----------------------------------------------------------------------

    /// All projects, in document order.
    pub fn projects(&self) -> &[ProjectNode] {
        &self.projects
    }

    /// All headers, project-major, in document order.
    pub fn headers(&self) -> &[HeaderNode] {
        &self.headers
    }

    /// All entities at every depth, in document pre-order.
    pub fn entities(&self) -> &[EntityNode] {
        &self.entities
    }

    pub fn project_node(&self, id: ProjectId) -> &ProjectNode {
        &self.projects[id.0]
    }

    pub fn header_node(&self, id: HeaderId) -> &HeaderNode {
        &self.headers[id.0]
    }

    pub fn entity_node(&self, id: EntityId) -> &EntityNode {
        &self.entities[id.0]
    }

    /// Immediate members of an entity, flattened in group order.
    pub fn members(&self, id: EntityId) -> impl Iterator<Item = &EntityNode> + '_ {
        self.entities[id.0]
            .groups
            .iter()
            .flat_map(move |group| group.members.iter().map(move |&m| &self.entities[m.0]))
    }

    /// Names of an entity's owners, outermost first.
    pub fn owner_names(&self, id: EntityId) -> Vec<&str> {
        self.entities[id.0]
            .owners
            .iter()
            .map(|&owner| self.entities[owner.0].data.name.as_str())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Find a project by exact name.
    pub fn project(&self, name: &str) -> Result<&ProjectNode> {
        self.projects
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ApiDocError::not_found("project", name))
    }

    /// Find a header by exact name within a project.
    pub fn header(&self, project: &str, header: &str) -> Result<&HeaderNode> {
        let project_node = self.project(project)?;
        project_node
            .headers
            .iter()
            .map(|&id| &self.headers[id.0])
            .find(|h| h.name == header)
            .ok_or_else(|| ApiDocError::not_found("header", format!("{project}/{header}")))
    }

    /// Find a top-level entity by exact name within a header.
    ///
    /// Member groups are already normalized by [`EntityGraph::load`].
    pub fn entity(&self, project: &str, header: &str, entity: &str) -> Result<&EntityNode> {
        let header_node = self.header(project, header)?;
        header_node
            .entities
            .iter()
            .map(|&id| &self.entities[id.0])
            .find(|e| e.data.name == entity)
            .ok_or_else(|| {
                ApiDocError::not_found("entity", format!("{project}/{header}/{entity}"))
            })
    }

    /// Follow a member chain from a top-level entity.
    ///
    /// An empty chain returns the entity itself.
    pub fn member<S: AsRef<str>>(
        &self,
        project: &str,
        header: &str,
        entity: &str,
        chain: &[S],
    ) -> Result<&EntityNode> {
        let mut node = self.entity(project, header, entity)?;
        for name in chain {
            let name = name.as_ref();
            let parent = node;
            node = self
                .members(parent.id)
                .find(|m| m.data.name == name)
                .ok_or_else(|| {
                    let mut path = self.owner_names(parent.id).join("::");
                    if !path.is_empty() {
                        path.push_str("::");
                    }
                    ApiDocError::not_found("member", format!("{path}{}::{name}", parent.data.name))
                })?;
        }
        Ok(node)
    }

    /// First header with this name, searching projects in order.
    pub(crate) fn find_header(&self, name: &str) -> Option<&HeaderNode> {
        self.headers.iter().find(|h| h.name == name)
    }

    /// First top-level entity with this name, searching headers in order.
    pub(crate) fn find_entity(&self, name: &str) -> Option<&EntityNode> {
        self.headers
            .iter()
            .flat_map(|h| h.entities.iter())
            .map(|&id| &self.entities[id.0])
            .find(|e| e.data.name == name)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Replace an empty description list with a single empty paragraph.
fn with_placeholder(descriptions: Vec<String>) -> Vec<String> {
    if descriptions.is_empty() {
        vec![String::new()]
    } else {
        descriptions
    }
}

/// Ensure the ungrouped (`""`) member group exists, first, for classes and
/// for any entity that already declares groups.
pub fn normalize_member_groups(kind: EntityKind, groups: &mut Vec<MemberGroup>) {
    if kind != EntityKind::Class && groups.is_empty() {
        return;
    }
    if !groups.iter().any(|g| g.name.is_empty()) {
        groups.insert(0, MemberGroup::default());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
