//! Schema definitions and the registry the reference parser validates
//! against.
//!
//! Three schema kinds exist: plain (stored values), derived (computed from an
//! expression by the derived-attribute evaluator) and virtual (fetched
//! through a connector by the virtual-attribute evaluator). The registry is a
//! snapshot: the parser and resolver read it, nothing in the engine mutates
//! it during a resolution pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::AttrSchemaType;

/// The three kinds of attribute schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaKind {
    Plain,
    Derived,
    Virtual,
}

/// A plain attribute schema: declared value type plus constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlainSchemaDef {
    pub key: String,
    #[serde(rename = "type", default)]
    pub value_type: AttrSchemaType,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub multivalue: bool,
}

impl PlainSchemaDef {
    pub fn new(key: impl Into<String>, value_type: AttrSchemaType) -> Self {
        Self {
            key: key.into(),
            value_type,
            unique: false,
            multivalue: false,
        }
    }
}

/// A derived attribute schema. The expression is opaque to the engine and is
/// handed to the derived-attribute evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerSchemaDef {
    pub key: String,
    pub expression: String,
}

impl DerSchemaDef {
    pub fn new(key: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expression: expression.into(),
        }
    }
}

/// A virtual attribute schema, backed by a live connector lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VirSchemaDef {
    pub key: String,
    /// Read-only virtual schemas are pulled but never pushed; the assembler
    /// drops their prepared attributes.
    #[serde(default)]
    pub readonly: bool,
}

impl VirSchemaDef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            readonly: false,
        }
    }
}

/// Resolved schema descriptor returned by registry lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDescriptor {
    Plain(PlainSchemaDef),
    Derived(DerSchemaDef),
    Virtual(VirSchemaDef),
}

impl SchemaDescriptor {
    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Plain(_) => SchemaKind::Plain,
            Self::Derived(_) => SchemaKind::Derived,
            Self::Virtual(_) => SchemaKind::Virtual,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Plain(s) => &s.key,
            Self::Derived(s) => &s.key,
            Self::Virtual(s) => &s.key,
        }
    }
}

/// Registry of all attribute schemas, keyed per kind.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    plain: HashMap<String, PlainSchemaDef>,
    derived: HashMap<String, DerSchemaDef>,
    virtual_: HashMap<String, VirSchemaDef>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plain(&mut self, schema: PlainSchemaDef) {
        self.plain.insert(schema.key.clone(), schema);
    }

    pub fn add_derived(&mut self, schema: DerSchemaDef) {
        self.derived.insert(schema.key.clone(), schema);
    }

    pub fn add_virtual(&mut self, schema: VirSchemaDef) {
        self.virtual_.insert(schema.key.clone(), schema);
    }

    pub fn plain(&self, key: &str) -> Option<&PlainSchemaDef> {
        self.plain.get(key)
    }

    pub fn derived(&self, key: &str) -> Option<&DerSchemaDef> {
        self.derived.get(key)
    }

    pub fn virtual_schema(&self, key: &str) -> Option<&VirSchemaDef> {
        self.virtual_.get(key)
    }

    /// Resolve a schema key of a specific kind.
    pub fn resolve_kind(&self, kind: SchemaKind, key: &str) -> Option<SchemaDescriptor> {
        match kind {
            SchemaKind::Plain => self.plain(key).cloned().map(SchemaDescriptor::Plain),
            SchemaKind::Derived => self.derived(key).cloned().map(SchemaDescriptor::Derived),
            SchemaKind::Virtual => self
                .virtual_schema(key)
                .cloned()
                .map(SchemaDescriptor::Virtual),
        }
    }

    /// Resolve a bare schema key, trying plain, then derived, then virtual.
    ///
    /// This is the lookup order the reference parser relies on when an
    /// expression carries no explicit kind.
    pub fn resolve(&self, key: &str) -> Option<SchemaDescriptor> {
        self.resolve_kind(SchemaKind::Plain, key)
            .or_else(|| self.resolve_kind(SchemaKind::Derived, key))
            .or_else(|| self.resolve_kind(SchemaKind::Virtual, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.add_plain(PlainSchemaDef::new("email", AttrSchemaType::String));
        registry.add_derived(DerSchemaDef::new("displayName", "firstname + ' ' + surname"));
        registry.add_virtual(VirSchemaDef::new("adGroups"));
        registry
    }

    #[test]
    fn test_lookup_order_prefers_plain() {
        let mut registry = registry();
        registry.add_derived(DerSchemaDef::new("email", "shadowed"));

        let descriptor = registry.resolve("email").unwrap();
        assert_eq!(descriptor.kind(), SchemaKind::Plain);
    }

    #[test]
    fn test_resolve_by_kind() {
        let registry = registry();
        assert!(registry.resolve_kind(SchemaKind::Virtual, "adGroups").is_some());
        assert!(registry.resolve_kind(SchemaKind::Plain, "adGroups").is_none());
        assert!(registry.resolve("missing").is_none());
    }
}
