//! The markup stages, in their fixed order.
//!
//! Each stage is a function `&str -> Vec<Piece>` over residual text.
//! A reference token ends at the first non-word character (letters, digits
//! and `_` are word characters) or at the end of the text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{Item, Piece, Reference, Stage};

/// Stage order. Later stages only see what earlier ones left as residual text.
pub(crate) const STAGES: [Stage; 4] = [lists, double_bracket_refs, namespace_refs, std_refs];

// ---------------------------------------------------------------------------
// Stage 1: Lists
// ---------------------------------------------------------------------------

/// Group `-`/`*` marked lines into a list forest. Depth is the marker count.
fn lists(text: &str) -> Vec<Piece> {
    if !text.lines().any(|line| list_marker(line).is_some()) {
        return vec![Piece::Rest(text.to_string())];
    }

    let mut out = Vec::new();
    let mut plain: Vec<&str> = Vec::new();
    let mut marked: Vec<(usize, &str)> = Vec::new();

    for line in text.lines() {
        match list_marker(line) {
            Some(entry) => {
                if !plain.is_empty() {
                    out.push(Piece::Rest(plain.join("\n")));
                    plain.clear();
                }
                marked.push(entry);
            }
            None => {
                if !marked.is_empty() {
                    out.push(Piece::List(nest(&marked)));
                    marked.clear();
                }
                plain.push(line);
            }
        }
    }

    if !marked.is_empty() {
        out.push(Piece::List(nest(&marked)));
    }
    if !plain.is_empty() {
        out.push(Piece::Rest(plain.join("\n")));
    }

    out
}

/// `(depth, text)` for a line starting with a `-`/`*` run, `None` otherwise.
///
/// Markers are counted from column 0; the remainder is the item text.
fn list_marker(line: &str) -> Option<(usize, &str)> {
    let depth = line.chars().take_while(|c| matches!(c, '-' | '*')).count();
    if depth == 0 {
        return None;
    }

    // markers are ASCII, so char count == byte offset
    Some((depth, line[depth..].trim()))
}

/// Nest each line under the closest preceding line of lower depth.
fn nest(lines: &[(usize, &str)]) -> Vec<Item> {
    let mut items = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (depth, text) = lines[i];
        let end = lines[i + 1..]
            .iter()
            .position(|&(d, _)| d <= depth)
            .map_or(lines.len(), |offset| i + 1 + offset);

        items.push(Item {
            content: vec![Piece::Rest(text.to_string())],
            children: nest(&lines[i + 1..end]),
        });
        i = end;
    }

    items
}

// ---------------------------------------------------------------------------
// Stage 2: [[name]] references
// ---------------------------------------------------------------------------

/// The name runs to the first `]]`, absorbing any extra `]` before it,
/// so `[[operator[]]]` names `operator[]`.
fn double_bracket_refs(text: &str) -> Vec<Piece> {
    static BRACKET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[\[(.+?\]*)\]\]").expect("valid regex"));

    split_references(text, &BRACKET_RE, |caps| Reference {
        target: caps[1].trim().to_string(),
        label: caps[1].to_string(),
    })
}

// ---------------------------------------------------------------------------
// Stage 3: compwolf:: references
// ---------------------------------------------------------------------------

fn namespace_refs(text: &str) -> Vec<Piece> {
    static NAMESPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\bcompwolf::\w+").expect("valid regex"));

    split_references(text, &NAMESPACE_RE, |caps| Reference {
        target: caps[0].to_string(),
        label: caps[0].to_string(),
    })
}

// ---------------------------------------------------------------------------
// Stage 4: std:: references
// ---------------------------------------------------------------------------

fn std_refs(text: &str) -> Vec<Piece> {
    static STD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\bstd::(\w+)").expect("valid regex"));

    split_references(text, &STD_RE, |caps| {
        let name = format!("std::{}", &caps[1]);
        Reference {
            target: name.clone(),
            label: name,
        }
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Cut `text` at every match of `re`, turning matches into references and
/// the gaps into residual text.
fn split_references(
    text: &str,
    re: &Regex,
    to_reference: impl Fn(&Captures<'_>) -> Reference,
) -> Vec<Piece> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            out.push(Piece::Rest(text[last..whole.start()].to_string()));
        }
        out.push(Piece::Reference(to_reference(&caps)));
        last = whole.end();
    }

    if last < text.len() {
        out.push(Piece::Rest(text[last..].to_string()));
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
