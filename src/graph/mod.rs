//! Contracts the engine consumes from its collaborators.
//!
//! The engine owns no storage and issues no writes: every lookup goes through
//! the [`IdentityGraph`] trait, every computed attribute through the
//! derived/virtual evaluators, and password recovery/generation through the
//! cipher and generator traits. All lookups return owned snapshots; callers
//! are expected to run resolution inside a read-only transactional scope.
//!
//! The in-memory implementations in [`in_memory`] back tests, examples and
//! development setups.

pub mod in_memory;

use crate::error::{DecodeError, PolicyViolation};
use crate::mapping::ExternalResource;
use crate::model::{
    AnyEntity, AnyObject, AnyTypeKind, Application, Group, Membership, Realm, Role, StoredPassword,
    User,
};
use crate::schema::{DerSchemaDef, VirSchemaDef};

pub use in_memory::{InMemoryGraph, RecordingVirAttrCache};

/// Read-only lookups over the identity model.
pub trait IdentityGraph: Send + Sync {
    fn find_user_by_key(&self, key: &str) -> Option<User>;
    fn find_user_by_username(&self, username: &str) -> Option<User>;
    fn find_group_by_key(&self, key: &str) -> Option<Group>;
    fn find_group_by_name(&self, name: &str) -> Option<Group>;
    fn find_any_object_by_key(&self, key: &str) -> Option<AnyObject>;
    fn find_any_object_by_name(&self, name: &str) -> Option<AnyObject>;

    /// Whether a relationship type with this key is defined.
    fn relationship_type_exists(&self, key: &str) -> bool;

    /// Whether an any-type with this key is defined. `USER` and `GROUP`
    /// always exist.
    fn any_type_exists(&self, key: &str) -> bool;

    fn find_application(&self, key: &str) -> Option<Application>;

    /// All roles assigned to the user.
    fn roles_of(&self, user: &User) -> Vec<Role>;

    fn find_realm_by_full_path(&self, full_path: &str) -> Option<Realm>;

    /// Lookup an entity of a given kind by key.
    fn find_entity_by_key(&self, kind: AnyTypeKind, key: &str) -> Option<AnyEntity> {
        match kind {
            AnyTypeKind::User => self.find_user_by_key(key).map(AnyEntity::User),
            AnyTypeKind::Group => self.find_group_by_key(key).map(AnyEntity::Group),
            AnyTypeKind::AnyObject => self.find_any_object_by_key(key).map(AnyEntity::AnyObject),
        }
    }
}

/// Computes derived attribute values from their configured expressions.
pub trait DerAttrEvaluator: Send + Sync {
    /// The derived value for the entity, scoped to a membership when one is
    /// bound. `None` contributes no value.
    fn value(
        &self,
        entity: &AnyEntity,
        membership: Option<&Membership>,
        schema: &DerSchemaDef,
    ) -> Option<String>;
}

/// Fetches virtual attribute values through the owning connector.
pub trait VirAttrEvaluator: Send + Sync {
    /// The virtual values for the entity, scoped to a membership when one is
    /// bound.
    fn values(
        &self,
        entity: &AnyEntity,
        membership: Option<&Membership>,
        schema: &VirSchemaDef,
    ) -> Vec<String>;
}

/// Cache of virtual attribute reads.
///
/// The resolver invalidates the entry for (entity type, entity key, schema
/// key) unconditionally before every virtual read. That is a deliberate
/// freshness policy, not incidental: a racing stale read for the same key is
/// an accepted eventual-consistency window.
pub trait VirAttrCache: Send + Sync {
    fn invalidate(&self, entity_type: &str, entity_key: &str, schema_key: &str);
}

/// Recovers plaintext credentials from their stored form.
pub trait PasswordCipher: Send + Sync {
    fn decode(&self, password: &StoredPassword) -> Result<String, DecodeError>;
}

/// Generates policy-compliant random passwords for a resource.
pub trait PasswordGenerator: Send + Sync {
    fn generate(&self, resource: &ExternalResource) -> Result<String, PolicyViolation>;
}

/// Evaluator that computes nothing. Default wiring for engines whose
/// mappings use no derived schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDerAttrEvaluator;

impl DerAttrEvaluator for NoopDerAttrEvaluator {
    fn value(&self, _: &AnyEntity, _: Option<&Membership>, _: &DerSchemaDef) -> Option<String> {
        None
    }
}

/// Evaluator that fetches nothing. Default wiring for engines whose
/// mappings use no virtual schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVirAttrEvaluator;

impl VirAttrEvaluator for NoopVirAttrEvaluator {
    fn values(&self, _: &AnyEntity, _: Option<&Membership>, _: &VirSchemaDef) -> Vec<String> {
        Vec::new()
    }
}

/// Cache that holds nothing, so invalidation is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVirAttrCache;

impl VirAttrCache for NoopVirAttrCache {
    fn invalidate(&self, _: &str, _: &str, _: &str) {}
}

/// Cipher that refuses every decode. Default wiring: stored credentials are
/// then simply unavailable for propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UndecodableCipher;

impl PasswordCipher for UndecodableCipher {
    fn decode(&self, password: &StoredPassword) -> Result<String, DecodeError> {
        Err(DecodeError::new(
            password.algorithm.to_string(),
            "no cipher configured",
        ))
    }
}

/// Generator that refuses every request. Default wiring for resources that
/// never ask for random passwords.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefusingPasswordGenerator;

impl PasswordGenerator for RefusingPasswordGenerator {
    fn generate(&self, _: &ExternalResource) -> Result<String, PolicyViolation> {
        Err(PolicyViolation::new("no password generator configured"))
    }
}
