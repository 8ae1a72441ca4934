//! The mapping engine: resolution plus push/pull assembly.
//!
//! [`MappingEngine`] wires the identity graph, the schema registry, the
//! derived/virtual evaluators, the virtual-attribute cache, the password
//! services and the transformer registry together. It holds no mutable
//! state of its own: every public call resolves against caller-supplied
//! entities and returns a value, so concurrent use for independent entities
//! is safe.
//!
//! The implementation is split by concern:
//!
//! - [`resolve`](self) - internal value resolution (`int_values`)
//! - push assembly (`prepare_attrs` and friends)
//! - pull assembly (`set_int_values` and friends)

mod builder;
mod pull;
mod push;
mod resolve;

pub use builder::MappingEngineBuilder;
pub use push::PreparedAttr;

use std::sync::Arc;

use crate::graph::{
    DerAttrEvaluator, IdentityGraph, PasswordCipher, PasswordGenerator, VirAttrCache,
    VirAttrEvaluator,
};
use crate::mapping::Provision;
use crate::model::{AccountView, AnyEntity, LinkedAccount, PlainAttr, User};
use crate::schema::SchemaRegistry;
use crate::transform::TransformerRegistry;

/// Attribute mapping and resolution engine.
pub struct MappingEngine<G: IdentityGraph> {
    pub(crate) graph: G,
    pub(crate) schemas: SchemaRegistry,
    pub(crate) der_evaluator: Arc<dyn DerAttrEvaluator>,
    pub(crate) vir_evaluator: Arc<dyn VirAttrEvaluator>,
    pub(crate) vir_cache: Arc<dyn VirAttrCache>,
    pub(crate) cipher: Arc<dyn PasswordCipher>,
    pub(crate) password_generator: Arc<dyn PasswordGenerator>,
    pub(crate) transformers: TransformerRegistry,
}

impl<G: IdentityGraph> MappingEngine<G> {
    /// Start building an engine over the given graph and schema registry.
    pub fn builder(graph: G, schemas: SchemaRegistry) -> MappingEngineBuilder<G> {
        MappingEngineBuilder::new(graph, schemas)
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Whether any mapping item of this provision targets the
    /// `mustChangePassword` field, i.e. pushing it communicates a
    /// change-password-at-next-login requirement.
    pub fn requires_password_change(&self, provision: &Provision) -> bool {
        provision
            .mapping
            .items
            .iter()
            .any(|item| item.int_attr_name == "mustChangePassword")
    }
}

/// Selects the account record supplying username or password for a user.
///
/// The default selects the user itself; linked-account propagation layers an
/// account's own values on top, falling back to the owner for whatever the
/// account does not carry.
pub trait AccountGetter: Sync {
    fn select(&self, user: &User) -> AccountView;
}

/// Selects the user's own username and credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAccountGetter;

impl AccountGetter for DefaultAccountGetter {
    fn select(&self, user: &User) -> AccountView {
        AccountView::of_user(user)
    }
}

/// Prefers the linked account's username when it has one.
pub struct LinkedUsernameGetter<'a> {
    pub account: &'a LinkedAccount,
}

impl AccountGetter for LinkedUsernameGetter<'_> {
    fn select(&self, user: &User) -> AccountView {
        if self.account.username.is_some() {
            AccountView::of_account(self.account)
        } else {
            AccountView::of_user(user)
        }
    }
}

/// Prefers the linked account's credential when it has one.
pub struct LinkedPasswordGetter<'a> {
    pub account: &'a LinkedAccount,
}

impl AccountGetter for LinkedPasswordGetter<'_> {
    fn select(&self, user: &User) -> AccountView {
        if self.account.password.is_some() {
            AccountView::of_account(self.account)
        } else {
            AccountView::of_user(user)
        }
    }
}

/// Reads a plain attribute from an entity, possibly overridden per account.
pub trait PlainAttrGetter: Sync {
    fn plain_attr(&self, entity: &AnyEntity, schema: &str) -> Option<PlainAttr>;
}

/// Reads the entity's own plain attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlainAttrGetter;

impl PlainAttrGetter for DefaultPlainAttrGetter {
    fn plain_attr(&self, entity: &AnyEntity, schema: &str) -> Option<PlainAttr> {
        entity.plain_attr(schema).cloned()
    }
}

/// Layers a linked account's plain attributes over the owning user's.
pub struct LinkedPlainAttrGetter<'a> {
    pub account: &'a LinkedAccount,
}

impl PlainAttrGetter for LinkedPlainAttrGetter<'_> {
    fn plain_attr(&self, entity: &AnyEntity, schema: &str) -> Option<PlainAttr> {
        if matches!(entity, AnyEntity::User(_)) {
            if let Some(attr) = self.account.plain_attr(schema) {
                return Some(attr.clone());
            }
        }
        entity.plain_attr(schema).cloned()
    }
}
