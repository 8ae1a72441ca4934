//! Parsing of mapping expressions into structured internal references.
//!
//! An expression names *what* internal value a mapping item reads:
//!
//! - a bare field or schema name (`username`, `email`);
//! - a cross-entity traversal followed by an inner field/schema name
//!   (`group:staff.name`, `user:admin.email`, `anyObject:prt-1.location`,
//!   `relationship:PRINTER.assigned.model`, `membership:staff.badge`);
//! - a privilege set (`privileges:crm`).
//!
//! Bare names resolve against the per-kind field table first, then against
//! the schema registry (plain, derived, virtual — in that order). A name
//! matching neither is a hard parse failure; schema existence is checked
//! here, at parse time. Parsing is pure: same expression + same registry
//! snapshot, same result.

use std::fmt;

use crate::error::{MappingError, MappingResult};
use crate::model::AnyTypeKind;
use crate::schema::{SchemaKind, SchemaRegistry};

const USER_FIELDS: &[&str] = &[
    "key",
    "username",
    "realm",
    "password",
    "suspended",
    "mustChangePassword",
    "status",
    "creationDate",
    "lastChangeDate",
    "creator",
    "lastModifier",
    "failedLogins",
];

const GROUP_FIELDS: &[&str] = &[
    "key",
    "name",
    "realm",
    "userOwner",
    "groupOwner",
    "status",
    "creationDate",
    "lastChangeDate",
    "creator",
    "lastModifier",
];

const ANY_OBJECT_FIELDS: &[&str] = &[
    "key",
    "name",
    "realm",
    "status",
    "creationDate",
    "lastChangeDate",
    "creator",
    "lastModifier",
];

/// Enumerated field names for an entity kind.
pub fn fields_for(kind: AnyTypeKind) -> &'static [&'static str] {
    match kind {
        AnyTypeKind::User => USER_FIELDS,
        AnyTypeKind::Group => GROUP_FIELDS,
        AnyTypeKind::AnyObject => ANY_OBJECT_FIELDS,
    }
}

/// Cross-entity traversal applied before reading the inner reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Traversal {
    /// A group the root entity is a member of, by group name.
    EnclosingGroup(String),
    /// A user related to the root entity, by username.
    RelatedUser(String),
    /// An any object related to the root entity, by name.
    RelatedAnyObject(String),
    /// All relationship right-ends of a given type whose entity type matches.
    RelationshipTyped {
        any_type: String,
        relationship_type: String,
    },
    /// Binds a membership context for schema lookups; the root entity itself
    /// stays the read target.
    MembershipOfGroup(String),
}

impl Traversal {
    /// Kind of the entity the inner reference is read from.
    fn target_kind(&self, root: AnyTypeKind) -> AnyTypeKind {
        match self {
            Self::EnclosingGroup(_) => AnyTypeKind::Group,
            Self::RelatedUser(_) => AnyTypeKind::User,
            Self::RelatedAnyObject(_) | Self::RelationshipTyped { .. } => AnyTypeKind::AnyObject,
            Self::MembershipOfGroup(_) => root,
        }
    }
}

/// The field-or-schema reference read from the traversal target (or from the
/// root entity when no traversal applies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerRef {
    Field(String),
    Schema { kind: SchemaKind, key: String },
}

/// Parsed form of a mapping expression. Exactly one shape applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrRef {
    /// A direct property of the root entity.
    Field(String),
    /// A plain/derived/virtual schema on the root entity.
    Schema { kind: SchemaKind, key: String },
    /// An inner reference read through a cross-entity traversal.
    CrossEntity { traversal: Traversal, inner: InnerRef },
    /// The privilege keys a user holds for a named application.
    Privileges { application: String },
}

impl AttrRef {
    /// Parse an expression for mappings rooted at the given entity kind.
    ///
    /// Schema references are validated against the registry snapshot; a bare
    /// name that is neither an enumerated field nor a registered schema fails
    /// hard with [`MappingError::InvalidExpression`].
    pub fn parse(
        expression: &str,
        kind: AnyTypeKind,
        registry: &SchemaRegistry,
    ) -> MappingResult<Self> {
        if expression.is_empty() {
            return Err(MappingError::invalid_expression(expression, "empty expression"));
        }

        if let Some(application) = expression.strip_prefix("privileges:") {
            if application.is_empty() {
                return Err(MappingError::invalid_expression(
                    expression,
                    "empty application name",
                ));
            }
            return Ok(Self::Privileges {
                application: application.to_owned(),
            });
        }

        for (prefix, build) in TRAVERSAL_PREFIXES {
            if let Some(rest) = expression.strip_prefix(prefix) {
                let (head, inner_name) = rest.split_once('.').ok_or_else(|| {
                    MappingError::invalid_expression(
                        expression,
                        "traversal requires an inner reference after '.'",
                    )
                })?;
                let traversal = build(head)
                    .map_err(|reason| MappingError::invalid_expression(expression, reason))?;
                let inner = parse_inner(inner_name, traversal.target_kind(kind), registry)
                    .map_err(|reason| MappingError::invalid_expression(expression, reason))?;
                return Ok(Self::CrossEntity { traversal, inner });
            }
        }

        match parse_inner(expression, kind, registry) {
            Ok(InnerRef::Field(name)) => Ok(Self::Field(name)),
            Ok(InnerRef::Schema { kind, key }) => Ok(Self::Schema { kind, key }),
            Err(reason) => Err(MappingError::invalid_expression(expression, reason)),
        }
    }

    /// The traversal, when this reference crosses entities.
    pub fn traversal(&self) -> Option<&Traversal> {
        match self {
            Self::CrossEntity { traversal, .. } => Some(traversal),
            _ => None,
        }
    }

    /// The field name read from the target, whether direct or inner.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::CrossEntity {
                inner: InnerRef::Field(name),
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// The schema reference read from the target, whether direct or inner.
    pub fn schema(&self) -> Option<(SchemaKind, &str)> {
        match self {
            Self::Schema { kind, key } => Some((*kind, key)),
            Self::CrossEntity {
                inner: InnerRef::Schema { kind, key },
                ..
            } => Some((*kind, key)),
            _ => None,
        }
    }
}

type TraversalBuilder = fn(&str) -> Result<Traversal, String>;

const TRAVERSAL_PREFIXES: &[(&str, TraversalBuilder)] = &[
    ("group:", |head| {
        require_segment(head, "group name")?;
        Ok(Traversal::EnclosingGroup(head.to_owned()))
    }),
    ("user:", |head| {
        require_segment(head, "username")?;
        Ok(Traversal::RelatedUser(head.to_owned()))
    }),
    ("anyObject:", |head| {
        require_segment(head, "any object name")?;
        Ok(Traversal::RelatedAnyObject(head.to_owned()))
    }),
    ("relationship:", |head| {
        let (any_type, relationship_type) = head
            .split_once(':')
            .ok_or_else(|| "relationship requires '<anyType>:<relationshipType>'".to_owned())?;
        require_segment(any_type, "any type")?;
        require_segment(relationship_type, "relationship type")?;
        Ok(Traversal::RelationshipTyped {
            any_type: any_type.to_owned(),
            relationship_type: relationship_type.to_owned(),
        })
    }),
    ("membership:", |head| {
        require_segment(head, "group name")?;
        Ok(Traversal::MembershipOfGroup(head.to_owned()))
    }),
];

fn require_segment(segment: &str, what: &str) -> Result<(), String> {
    if segment.is_empty() {
        Err(format!("empty {}", what))
    } else {
        Ok(())
    }
}

fn parse_inner(
    name: &str,
    kind: AnyTypeKind,
    registry: &SchemaRegistry,
) -> Result<InnerRef, String> {
    if name.is_empty() {
        return Err("empty field or schema name".to_owned());
    }
    if fields_for(kind).contains(&name) {
        return Ok(InnerRef::Field(name.to_owned()));
    }
    match registry.resolve(name) {
        Some(descriptor) => Ok(InnerRef::Schema {
            kind: descriptor.kind(),
            key: descriptor.key().to_owned(),
        }),
        None => Err(format!(
            "'{}' is neither a {} field nor a registered schema",
            name, kind
        )),
    }
}

impl fmt::Display for InnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{}", name),
            Self::Schema { key, .. } => write!(f, "{}", key),
        }
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{}", name),
            Self::Schema { key, .. } => write!(f, "{}", key),
            Self::CrossEntity { traversal, inner } => match traversal {
                Traversal::EnclosingGroup(name) => write!(f, "group:{}.{}", name, inner),
                Traversal::RelatedUser(name) => write!(f, "user:{}.{}", name, inner),
                Traversal::RelatedAnyObject(name) => write!(f, "anyObject:{}.{}", name, inner),
                Traversal::RelationshipTyped {
                    any_type,
                    relationship_type,
                } => write!(f, "relationship:{}:{}.{}", any_type, relationship_type, inner),
                Traversal::MembershipOfGroup(name) => write!(f, "membership:{}.{}", name, inner),
            },
            Self::Privileges { application } => write!(f, "privileges:{}", application),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttrSchemaType;
    use crate::schema::{DerSchemaDef, PlainSchemaDef, VirSchemaDef};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.add_plain(PlainSchemaDef::new("email", AttrSchemaType::String));
        registry.add_plain(PlainSchemaDef::new("badge", AttrSchemaType::String));
        registry.add_derived(DerSchemaDef::new("displayName", "firstname + ' ' + surname"));
        registry.add_virtual(VirSchemaDef::new("adGroups"));
        registry
    }

    #[test]
    fn test_bare_field() {
        let parsed = AttrRef::parse("username", AnyTypeKind::User, &registry()).unwrap();
        assert_eq!(parsed, AttrRef::Field("username".to_owned()));
    }

    #[test]
    fn test_bare_schema_kinds() {
        let registry = registry();
        assert!(matches!(
            AttrRef::parse("email", AnyTypeKind::User, &registry).unwrap(),
            AttrRef::Schema {
                kind: SchemaKind::Plain,
                ..
            }
        ));
        assert!(matches!(
            AttrRef::parse("displayName", AnyTypeKind::User, &registry).unwrap(),
            AttrRef::Schema {
                kind: SchemaKind::Derived,
                ..
            }
        ));
        assert!(matches!(
            AttrRef::parse("adGroups", AnyTypeKind::User, &registry).unwrap(),
            AttrRef::Schema {
                kind: SchemaKind::Virtual,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_bare_name_is_parse_error() {
        let result = AttrRef::parse("nosuchthing", AnyTypeKind::User, &registry());
        assert!(matches!(
            result,
            Err(MappingError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_group_traversal_uses_group_field_table() {
        // "name" is not a user field, but the inner reference is resolved
        // against the traversal target kind
        let parsed = AttrRef::parse("group:staff.name", AnyTypeKind::User, &registry()).unwrap();
        assert_eq!(
            parsed,
            AttrRef::CrossEntity {
                traversal: Traversal::EnclosingGroup("staff".to_owned()),
                inner: InnerRef::Field("name".to_owned()),
            }
        );
    }

    #[test]
    fn test_relationship_traversal() {
        let parsed = AttrRef::parse(
            "relationship:PRINTER:assigned.location",
            AnyTypeKind::User,
            &registry(),
        );
        // "location" is not registered: hard failure
        assert!(parsed.is_err());

        let mut registry = registry();
        registry.add_plain(PlainSchemaDef::new("location", AttrSchemaType::String));
        let parsed = AttrRef::parse(
            "relationship:PRINTER:assigned.location",
            AnyTypeKind::User,
            &registry,
        )
        .unwrap();
        assert_eq!(
            parsed.traversal(),
            Some(&Traversal::RelationshipTyped {
                any_type: "PRINTER".to_owned(),
                relationship_type: "assigned".to_owned(),
            })
        );
        assert_eq!(parsed.schema(), Some((SchemaKind::Plain, "location")));
    }

    #[test]
    fn test_membership_traversal_binds_context() {
        let parsed =
            AttrRef::parse("membership:staff.badge", AnyTypeKind::User, &registry()).unwrap();
        assert!(matches!(
            parsed.traversal(),
            Some(Traversal::MembershipOfGroup(name)) if name == "staff"
        ));
    }

    #[test]
    fn test_privileges() {
        let parsed = AttrRef::parse("privileges:crm", AnyTypeKind::User, &registry()).unwrap();
        assert_eq!(
            parsed,
            AttrRef::Privileges {
                application: "crm".to_owned()
            }
        );
    }

    #[test]
    fn test_malformed_expressions() {
        let registry = registry();
        for expression in [
            "",
            "group:.email",
            "group:staff",
            "relationship:PRINTER.email",
            "relationship::assigned.email",
            "privileges:",
            "membership:staff.",
        ] {
            assert!(
                AttrRef::parse(expression, AnyTypeKind::User, &registry).is_err(),
                "expected parse failure for '{}'",
                expression
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let registry = registry();
        for expression in [
            "username",
            "email",
            "adGroups",
            "group:staff.name",
            "user:admin.email",
            "anyObject:prt-1.email",
            "relationship:PRINTER:assigned.email",
            "membership:staff.badge",
            "privileges:crm",
        ] {
            let parsed = AttrRef::parse(expression, AnyTypeKind::User, &registry).unwrap();
            assert_eq!(parsed.to_string(), expression);
            let reparsed =
                AttrRef::parse(&parsed.to_string(), AnyTypeKind::User, &registry).unwrap();
            assert_eq!(reparsed, parsed);
        }
    }
}
