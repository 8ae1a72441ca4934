//! Internal identity model: entities, attributes, values and pull drafts.
//!
//! These types are the engine's view of the identity graph. They are owned
//! snapshots — graph lookups clone out of storage, and the engine never
//! writes back.
//!
//! # Key Types
//!
//! - [`AnyEntity`] - Tagged union over users, groups and any objects
//! - [`AttrValue`] / [`AttrSchemaType`] - Typed internal values with coercion
//! - [`PlainAttr`] - Stored attribute with unique/multi value semantics
//! - [`AnyDraft`] - Mutable pull-direction representation

pub mod account;
pub mod draft;
pub mod entity;
pub mod membership;
pub mod value;

pub use account::{AccountView, LinkedAccount};
pub use draft::{
    AnyDraft, AnyObjectDraft, DraftAttr, GroupDraft, MembershipDraft, OWNER_SENTINEL_SCHEMA,
    RealmDraft, UserDraft,
};
pub use entity::{
    AnyEntity, AnyObject, AnyTypeKind, CipherAlgorithm, Group, PlainAttr, Realm, StoredPassword,
    User,
};
pub use membership::{Application, Membership, Privilege, Relationship, Role};
pub use value::{AttrSchemaType, AttrValue, parse_bool};
