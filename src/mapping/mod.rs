//! Mapping configuration: items, mappings, provisions and org-unit mappings.
//!
//! These types are loaded from configuration (JSON via serde) once per
//! provisioning operation and never mutated by the engine. Each
//! [`MappingItem`] pairs an internal attribute expression with an external
//! attribute name; [`Provision`] binds a mapping to an entity type and an
//! external resource.

pub mod expr;

use serde::{Deserialize, Serialize};

use crate::model::{AnyEntity, AnyTypeKind, Realm};

pub use expr::{AttrRef, InnerRef, Traversal};

/// Direction(s) a mapping item participates in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MappingPurpose {
    Propagation,
    Pull,
    #[default]
    Both,
    None,
}

impl MappingPurpose {
    pub fn for_propagation(self) -> bool {
        matches!(self, Self::Propagation | Self::Both)
    }

    pub fn for_pull(self) -> bool {
        matches!(self, Self::Pull | Self::Both)
    }
}

/// One declarative mapping rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingItem {
    /// Internal attribute expression, parsed by [`AttrRef::parse`].
    pub int_attr_name: String,
    /// Attribute name on the external resource.
    pub ext_attr_name: String,
    /// At most one item per mapping carries the connector key.
    #[serde(default)]
    pub conn_object_key: bool,
    /// Password items feed the `__PASSWORD__` operational attribute.
    #[serde(default)]
    pub password: bool,
    /// Opaque predicate consumed by validation tooling, not by this engine.
    #[serde(default = "MappingItem::default_mandatory_condition")]
    pub mandatory_condition: String,
    #[serde(default)]
    pub purpose: MappingPurpose,
    /// Ordered transformer identifiers, resolved through the registry.
    #[serde(default)]
    pub transformers: Vec<String>,
}

impl MappingItem {
    pub fn new(int_attr_name: impl Into<String>, ext_attr_name: impl Into<String>) -> Self {
        Self {
            int_attr_name: int_attr_name.into(),
            ext_attr_name: ext_attr_name.into(),
            conn_object_key: false,
            password: false,
            mandatory_condition: Self::default_mandatory_condition(),
            purpose: MappingPurpose::Both,
            transformers: Vec::new(),
        }
    }

    fn default_mandatory_condition() -> String {
        "false".to_owned()
    }
}

/// Ordered collection of mapping items for one entity-type/resource pairing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Mapping {
    pub items: Vec<MappingItem>,
}

impl Mapping {
    pub fn new(items: Vec<MappingItem>) -> Self {
        Self { items }
    }

    /// Load a mapping from its JSON rendition.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// The item flagged as connector key, if any.
    pub fn conn_object_key_item(&self) -> Option<&MappingItem> {
        self.items.iter().find(|item| item.conn_object_key)
    }

    /// Items participating in push, in declaration order.
    pub fn propagation_items(&self) -> impl Iterator<Item = &MappingItem> {
        self.items.iter().filter(|item| item.purpose.for_propagation())
    }

    /// Items participating in pull, in declaration order.
    pub fn pull_items(&self) -> impl Iterator<Item = &MappingItem> {
        self.items.iter().filter(|item| item.purpose.for_pull())
    }
}

/// Template for the external object name, evaluated against the entity and
/// its resolved connector key.
///
/// Placeholders: `{value}` (connector key), `{name}` (display name),
/// `{realm}` (realm full path). When no template is configured the connector
/// key itself is used as the object name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectLink(pub String);

impl ObjectLink {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn evaluate(&self, entity: &AnyEntity, conn_object_key: &str) -> String {
        self.0
            .replace("{value}", conn_object_key)
            .replace("{name}", entity.name())
            .replace("{realm}", entity.realm())
    }

    pub fn evaluate_realm(&self, realm: &Realm, conn_object_key: &str) -> String {
        self.0
            .replace("{value}", conn_object_key)
            .replace("{name}", &realm.name)
            .replace("{realm}", &realm.full_path)
    }
}

/// Settings of the external resource a provision pushes to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalResource {
    pub key: String,
    /// Generate a policy-compliant random password when neither the caller
    /// nor the stored credential can supply one.
    #[serde(default)]
    pub random_pwd_if_not_provided: bool,
}

impl ExternalResource {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            random_pwd_if_not_provided: false,
        }
    }
}

/// A provisioning mapping for one entity type on one resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provision {
    pub any_type: AnyTypeKind,
    pub mapping: Mapping,
    pub resource: ExternalResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_link: Option<ObjectLink>,
}

impl Provision {
    pub fn new(any_type: AnyTypeKind, mapping: Mapping, resource: ExternalResource) -> Self {
        Self {
            any_type,
            mapping,
            resource,
            obj_link: None,
        }
    }

    /// Load a provision from its JSON rendition.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

/// A realm mapping item. Realms expose only `key`, `name` and `fullpath`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrgUnitItem {
    pub int_attr_name: String,
    pub ext_attr_name: String,
    #[serde(default)]
    pub conn_object_key: bool,
    #[serde(default)]
    pub purpose: MappingPurpose,
    #[serde(default)]
    pub transformers: Vec<String>,
}

impl OrgUnitItem {
    pub fn new(int_attr_name: impl Into<String>, ext_attr_name: impl Into<String>) -> Self {
        Self {
            int_attr_name: int_attr_name.into(),
            ext_attr_name: ext_attr_name.into(),
            conn_object_key: false,
            purpose: MappingPurpose::Both,
            transformers: Vec::new(),
        }
    }
}

/// Mapping of realms onto an external directory tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrgUnit {
    pub items: Vec<OrgUnitItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_link: Option<ObjectLink>,
}

impl OrgUnit {
    pub fn conn_object_key_item(&self) -> Option<&OrgUnitItem> {
        self.items.iter().find(|item| item.conn_object_key)
    }

    pub fn propagation_items(&self) -> impl Iterator<Item = &OrgUnitItem> {
        self.items.iter().filter(|item| item.purpose.for_propagation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, User};

    #[test]
    fn test_mapping_item_serialization() {
        let mut item = MappingItem::new("email", "mail");
        item.transformers.push("lowercase".to_owned());

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"int_attr_name\":\"email\""));
        assert!(json.contains("\"lowercase\""));

        let parsed: MappingItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
        assert_eq!(parsed.mandatory_condition, "false");
    }

    #[test]
    fn test_mapping_from_json_applies_defaults() {
        let mapping = Mapping::from_json(
            r#"{"items":[{"int_attr_name":"email","ext_attr_name":"mail"}]}"#,
        )
        .unwrap();
        assert_eq!(mapping.items.len(), 1);
        assert!(!mapping.items[0].conn_object_key);
        assert_eq!(mapping.items[0].purpose, MappingPurpose::Both);
    }

    #[test]
    fn test_purpose_filtering() {
        let mut pull_only = MappingItem::new("email", "mail");
        pull_only.purpose = MappingPurpose::Pull;
        let mapping = Mapping::new(vec![MappingItem::new("username", "uid"), pull_only]);

        let pushed: Vec<_> = mapping
            .propagation_items()
            .map(|i| i.ext_attr_name.as_str())
            .collect();
        assert_eq!(pushed, vec!["uid"]);
        assert_eq!(mapping.pull_items().count(), 2);
    }

    #[test]
    fn test_conn_object_key_item() {
        let mut key_item = MappingItem::new("username", "uid");
        key_item.conn_object_key = true;
        let mapping = Mapping::new(vec![MappingItem::new("email", "mail"), key_item]);

        assert_eq!(
            mapping.conn_object_key_item().unwrap().ext_attr_name,
            "uid"
        );
    }

    #[test]
    fn test_obj_link_placeholders() {
        let link = ObjectLink::new("uid={value},ou=people,o={realm}");
        let mut user = User::new("u1", "jdoe");
        user.realm = "/corp".to_owned();
        let entity = AnyEntity::User(user);

        assert_eq!(
            link.evaluate(&entity, "jdoe"),
            "uid=jdoe,ou=people,o=/corp"
        );

        let group = AnyEntity::Group(Group::new("g1", "staff"));
        let name_link = ObjectLink::new("cn={name}");
        assert_eq!(name_link.evaluate(&group, "ignored"), "cn=staff");
    }
}
