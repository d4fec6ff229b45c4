//! Markdown rendering of parsed nodes.

use crate::{ListItem, Node, Reference};

/// Maps a reference target to a link, or `None` to render it unlinked.
pub trait LinkResolver {
    fn link_for(&self, target: &str) -> Option<String>;
}

impl<F> LinkResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn link_for(&self, target: &str) -> Option<String> {
        self(target)
    }
}

/// Resolver that never links.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinks;

impl LinkResolver for NoLinks {
    fn link_for(&self, _target: &str) -> Option<String> {
        None
    }
}

/// Render nodes as Markdown, resolving references through `resolver`.
pub fn render_markdown(nodes: &[Node], resolver: &dyn LinkResolver) -> String {
    let mut out = String::new();
    render_nodes(nodes, resolver, &mut out);
    out.trim_end_matches('\n').to_string()
}

fn render_nodes(nodes: &[Node], resolver: &dyn LinkResolver, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { text } => out.push_str(text),
            Node::Reference(reference) => render_reference(reference, resolver, out),
            Node::List { items } => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                render_items(items, 0, resolver, out);
            }
        }
    }
}

fn render_reference(reference: &Reference, resolver: &dyn LinkResolver, out: &mut String) {
    match resolver.link_for(&reference.target) {
        Some(link) => {
            out.push('[');
            out.push_str(&reference.label);
            out.push_str("](");
            out.push_str(&link);
            out.push(')');
        }
        None => out.push_str(&reference.label),
    }
}

fn render_items(items: &[ListItem], depth: usize, resolver: &dyn LinkResolver, out: &mut String) {
    for item in items {
        out.push_str(&"  ".repeat(depth));
        out.push_str("- ");
        render_nodes(&item.content, resolver, out);
        out.push('\n');
        render_items(&item.children, depth + 1, resolver, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn links(target: &str) -> Option<String> {
        match target {
            "vec2::length" => Some("/api/Core/math.h/vec2/length".into()),
            "std::vector" => Some("https://search.example/?q=vector".into()),
            _ => None,
        }
    }

    #[test]
    fn renders_resolved_and_unresolved_references() {
        let nodes = parse("see [[vec2::length]], [[missing]] and std::vector");
        let md = render_markdown(&nodes, &links);
        assert_eq!(
            md,
            "see [vec2::length](/api/Core/math.h/vec2/length), missing and \
             [std::vector](https://search.example/?q=vector)"
        );
    }

    #[test]
    fn renders_nested_lists() {
        let nodes = parse("Points:\n- a\n-- b\n- c\nDone.");
        let md = render_markdown(&nodes, &NoLinks);
        assert_eq!(md, "Points:\n- a\n  - b\n- c\nDone.");
    }

    #[test]
    fn no_links_renders_labels() {
        let nodes = parse("[[vec2::length]]");
        assert_eq!(render_markdown(&nodes, &NoLinks), "vec2::length");
    }
}
