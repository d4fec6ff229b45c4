//! Shared types, error model, configuration, and path encoding for apidoc.
//!
//! This crate is the foundation depended on by all other apidoc crates.
//! It provides:
//! - [`ApiDocError`], the unified error type
//! - The raw document model ([`Document`], [`Project`], [`Header`], [`Entity`])
//! - Configuration ([`AppConfig`], config loading)
//! - Path segment encoding ([`path`])

pub mod config;
pub mod error;
pub mod path;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LinksConfig, RoutesConfig, SiteConfig, StoreConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{ApiDocError, Result};
pub use path::SegmentEncoding;
pub use types::{
    Constructor, Document, EnumValue, Entity, EntityData, EntityKind, Example, Header,
    MemberGroup, Overload, Project,
};
