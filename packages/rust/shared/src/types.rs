//! Raw document model, as stored by the document store.
//!
//! Every collection defaults to empty so that partially edited documents
//! still deserialize. Decoration (back-references, owner chains, display
//! defaults) happens later, in `apidoc-graph`.

use serde::{Deserialize, Serialize};

use crate::error::{ApiDocError, Result};

// ---------------------------------------------------------------------------
// Document / Project / Header
// ---------------------------------------------------------------------------

/// Root of the documentation tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Document {
    /// Parse a document from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ApiDocError::parse(format!("invalid document JSON: {e}")))
    }
}

/// A documented library, owning its headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub brief_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detailed_description: Vec<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
}

/// A single header file within a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub name: String,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Which kind of C++ declaration an entity documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Undefined,
    Concept,
    Class,
    Function,
    Variable,
    Enum,
    Alias,
    Macro,
}

impl EntityKind {
    /// Lowercase label, identical to the JSON tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Concept => "concept",
            Self::Class => "class",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Enum => "enum",
            Self::Alias => "alias",
            Self::Macro => "macro",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A documented declaration together with its nested members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(flatten)]
    pub data: EntityData,
    /// Class member groups. The group named `""` holds ungrouped members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_groups: Vec<MemberGroup>,
}

/// All entity fields except the nested members.
///
/// Fields that only apply to some kinds stay empty for the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub declaration: String,
    #[serde(default)]
    pub brief_description: String,
    #[serde(default)]
    pub detailed_description: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Example>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,

    // class
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<Constructor>,

    // function
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overloads: Vec<Overload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<String>,

    // enum
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<EnumValue>,
}

/// A code example attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// A named group of class members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<Entity>,
}

/// One overload of a function or constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overload {
    #[serde(default)]
    pub declaration: String,
    #[serde(default)]
    pub description: String,
}

/// Constructor documentation of a class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    #[serde(default)]
    pub brief_description: String,
    #[serde(default)]
    pub overloads: Vec<Overload>,
}

/// A single enumerator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub brief_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/json")
            .join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    #[test]
    fn entity_kind_defaults_to_undefined() {
        let entity: Entity = serde_json::from_str(r#"{ "name": "thing" }"#).expect("parse");
        assert_eq!(entity.data.kind, EntityKind::Undefined);
        assert!(entity.member_groups.is_empty());
        assert!(entity.data.detailed_description.is_empty());
    }

    #[test]
    fn class_fields_deserialize() {
        let json = r#"{
            "name": "vec2",
            "type": "class",
            "baseClasses": ["vec_base"],
            "copyable": true,
            "constructor": { "briefDescription": "Builds it.", "overloads": [{ "declaration": "vec2()" }] },
            "memberGroups": [{ "name": "", "items": [{ "name": "x", "type": "variable" }] }]
        }"#;
        let entity: Entity = serde_json::from_str(json).expect("parse");
        assert_eq!(entity.data.kind, EntityKind::Class);
        assert_eq!(entity.data.base_classes, vec!["vec_base".to_string()]);
        assert_eq!(entity.data.copyable, Some(true));
        assert_eq!(entity.data.movable, None);
        assert_eq!(entity.data.constructor.as_ref().map(|c| c.overloads.len()), Some(1));
        assert_eq!(entity.member_groups[0].items[0].data.name, "x");
    }

    #[test]
    fn serialization_uses_camel_case_and_type_tag() {
        let mut entity = Entity::default();
        entity.data.name = "length".into();
        entity.data.kind = EntityKind::Function;
        entity.data.brief_description = "Euclidean length.".into();

        let value = serde_json::to_value(&entity).expect("serialize");
        assert_eq!(value["type"], "function");
        assert_eq!(value["briefDescription"], "Euclidean length.");
        assert!(value.get("memberGroups").is_none());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = Document::from_json("{ not json").unwrap_err();
        assert!(err.to_string().contains("invalid document JSON"));
    }

    #[test]
    fn document_fixture_validates() {
        let doc = Document::from_json(&fixture("document.fixture.json")).expect("fixture");
        assert_eq!(doc.projects.len(), 2);
        assert_eq!(doc.projects[0].name, "Core");
        assert_eq!(doc.projects[0].headers[0].name, "math.h");
        assert_eq!(doc.projects[0].headers[0].entities[0].data.name, "vec2");
    }
}
