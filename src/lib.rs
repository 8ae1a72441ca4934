//! Attribute mapping and resolution engine for identity provisioning.
//!
//! Translates between an internal identity model (users, groups, any
//! objects, their plain/derived/virtual attributes, memberships,
//! relationships and privileges) and an external connector's flat attribute
//! set, in both directions: push (propagation) and pull (reconciliation).
//!
//! # Core Components
//!
//! - [`AttrRef`] - Parsed form of a declarative mapping expression
//! - [`MappingEngine`] - Resolution plus push/pull attribute assembly
//! - [`IdentityGraph`] - Read-only lookups the engine resolves against
//! - [`TransformerRegistry`] - Ordered per-item value transformations
//!
//! # Quick Start
//!
//! ```rust
//! use idm_mapper::engine::MappingEngine;
//! use idm_mapper::graph::InMemoryGraph;
//! use idm_mapper::mapping::{ExternalResource, Mapping, MappingItem, Provision};
//! use idm_mapper::model::{AnyEntity, AnyTypeKind, User};
//! use idm_mapper::schema::SchemaRegistry;
//!
//! let mut graph = InMemoryGraph::new();
//! graph.add_user(User::new("u1", "jdoe"));
//!
//! let engine = MappingEngine::builder(graph, SchemaRegistry::new()).build();
//!
//! let mut key_item = MappingItem::new("username", "uid");
//! key_item.conn_object_key = true;
//! let provision = Provision::new(
//!     AnyTypeKind::User,
//!     Mapping::new(vec![key_item]),
//!     ExternalResource::new("ldap"),
//! );
//!
//! let root = AnyEntity::User(User::new("u1", "jdoe"));
//! let (conn_object_key, attrs) = engine.prepare_attrs(&root, None, false, None, &provision);
//! assert_eq!(conn_object_key.as_deref(), Some("jdoe"));
//! assert!(attrs.contains("__NAME__"));
//! ```

pub mod engine;
pub mod error;
pub mod external;
pub mod graph;
pub mod mapping;
pub mod model;
pub mod schema;
pub mod transform;

// Re-export commonly used types for convenience
pub use engine::{
    AccountGetter, DefaultAccountGetter, DefaultPlainAttrGetter, MappingEngine,
    MappingEngineBuilder, PlainAttrGetter, PreparedAttr,
};
pub use error::{DecodeError, MappingError, MappingResult, PolicyViolation};
pub use external::{AttributeSet, ExternalAttr};
pub use graph::{IdentityGraph, InMemoryGraph};
pub use mapping::{AttrRef, Mapping, MappingItem, MappingPurpose, OrgUnit, Provision, Traversal};
pub use model::{AnyDraft, AnyEntity, AnyTypeKind, AttrSchemaType, AttrValue};
pub use schema::{SchemaKind, SchemaRegistry};
pub use transform::{ItemTransformer, TransformerRegistry};
