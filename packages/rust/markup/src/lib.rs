//! Documentation string markup.
//!
//! Turns a free-form description into render nodes: nested lists, plain
//! text, and cross-references. Parsing runs a fixed chain of stages (see
//! [`stages`]); each stage only sees the residual text the previous stages
//! left unmatched, so stages never reinterpret each other's output.
//! Parsing is total: anything no stage recognises stays plain text.

mod render;
mod stages;

use serde::Serialize;
use tracing::trace;

pub use render::{LinkResolver, NoLinks, render_markdown};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A parsed piece of a documentation string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Node {
    /// Plain text, rendered verbatim.
    Text { text: String },
    /// A cross-reference, resolved by name at render time.
    Reference(Reference),
    /// A list forest.
    List { items: Vec<ListItem> },
}

impl Node {
    /// Shorthand for a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Shorthand for a reference whose label is its target.
    pub fn reference(target: impl Into<String>) -> Self {
        let target = target.into();
        Self::Reference(Reference {
            label: target.clone(),
            target,
        })
    }
}

/// An inline cross-reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Scoped name handed to the name resolver.
    pub target: String,
    /// Text shown for the link.
    pub label: String,
}

/// One list item and the items nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub content: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ListItem>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Intermediate form shared by the stages: either finished structure or
/// residual text still open to later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Rest(String),
    Reference(Reference),
    List(Vec<Item>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Item {
    pub content: Vec<Piece>,
    pub children: Vec<Item>,
}

/// A single formatting stage: residual text in, pieces out.
pub(crate) type Stage = fn(&str) -> Vec<Piece>;

/// Parse a documentation string into render nodes.
pub fn parse(text: &str) -> Vec<Node> {
    let mut pieces = vec![Piece::Rest(text.to_string())];

    for stage in stages::STAGES {
        pieces = apply_stage(stage, pieces);
    }

    let nodes = finish(pieces);
    trace!(input_len = text.len(), nodes = nodes.len(), "markup parsed");
    nodes
}

/// Every reference in `nodes`, in document order, including those inside lists.
pub fn references(nodes: &[Node]) -> Vec<&Reference> {
    let mut out = Vec::new();
    collect_references(nodes, &mut out);
    out
}

fn collect_references<'a>(nodes: &'a [Node], out: &mut Vec<&'a Reference>) {
    for node in nodes {
        match node {
            Node::Reference(reference) => out.push(reference),
            Node::List { items } => collect_item_references(items, out),
            Node::Text { .. } => {}
        }
    }
}

fn collect_item_references<'a>(items: &'a [ListItem], out: &mut Vec<&'a Reference>) {
    for item in items {
        collect_references(&item.content, out);
        collect_item_references(&item.children, out);
    }
}

/// Run `stage` over every residual text, descending into list items.
fn apply_stage(stage: Stage, pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());

    for piece in pieces {
        match piece {
            Piece::Rest(text) => out.extend(stage(&text)),
            Piece::List(items) => out.push(Piece::List(
                items.into_iter().map(|item| apply_item(stage, item)).collect(),
            )),
            done @ Piece::Reference(_) => out.push(done),
        }
    }

    out
}

fn apply_item(stage: Stage, item: Item) -> Item {
    Item {
        content: apply_stage(stage, item.content),
        children: item
            .children
            .into_iter()
            .map(|child| apply_item(stage, child))
            .collect(),
    }
}

/// Convert pieces to nodes; leftover residual text becomes plain text.
fn finish(pieces: Vec<Piece>) -> Vec<Node> {
    pieces
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Rest(text) if text.is_empty() => None,
            Piece::Rest(text) => Some(Node::Text { text }),
            Piece::Reference(reference) => Some(Node::Reference(reference)),
            Piece::List(items) => Some(Node::List {
                items: items.into_iter().map(finish_item).collect(),
            }),
        })
        .collect()
}

fn finish_item(item: Item) -> ListItem {
    ListItem {
        content: finish(item.content),
        children: item.children.into_iter().map(finish_item).collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
