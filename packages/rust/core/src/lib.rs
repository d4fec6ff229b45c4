//! Page rendering and static site builds for apidoc.
//!
//! This crate ties the document store, the entity graph, and the markup
//! pipeline together into end-to-end workflows (e.g., `build_site`).

pub mod edit;
pub mod page;
pub mod site;
