//! Internal identity entities: users, groups, any objects and realms.
//!
//! The resolver never downcasts: cross-kind behavior goes through the
//! [`AnyEntity`] tagged union and its capability accessors, and generic field
//! reads go through an explicit per-kind field table ([`AnyEntity::read_field`])
//! that fails closed on anything not enumerated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::LinkedAccount;
use super::membership::{Membership, Relationship};
use super::value::AttrValue;

/// The three entity kinds the identity model distinguishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnyTypeKind {
    User,
    Group,
    AnyObject,
}

impl fmt::Display for AnyTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "USER",
            Self::Group => "GROUP",
            Self::AnyObject => "ANY_OBJECT",
        };
        write!(f, "{}", name)
    }
}

/// Algorithm a stored credential was encoded with.
///
/// Only invertible algorithms allow the engine to recover a plaintext
/// password for propagation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Aes,
    Sha256,
    Sha512,
    Bcrypt,
}

impl CipherAlgorithm {
    pub fn is_invertible(self) -> bool {
        matches!(self, Self::Aes)
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Aes => "AES",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Bcrypt => "BCRYPT",
        };
        write!(f, "{}", name)
    }
}

/// An encoded credential together with its cipher algorithm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredPassword {
    pub ciphertext: String,
    pub algorithm: CipherAlgorithm,
}

impl StoredPassword {
    pub fn new(ciphertext: impl Into<String>, algorithm: CipherAlgorithm) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            algorithm,
        }
    }

    /// Whether the plaintext can be recovered from this credential.
    pub fn can_decode(&self) -> bool {
        self.algorithm.is_invertible()
    }
}

/// A stored plain attribute: schema key plus either a unique value or a
/// list of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlainAttr {
    pub schema: String,
    pub unique_value: Option<AttrValue>,
    pub values: Vec<AttrValue>,
}

impl PlainAttr {
    pub fn new(schema: impl Into<String>, values: Vec<AttrValue>) -> Self {
        Self {
            schema: schema.into(),
            unique_value: None,
            values,
        }
    }

    pub fn unique(schema: impl Into<String>, value: AttrValue) -> Self {
        Self {
            schema: schema.into(),
            unique_value: Some(value),
            values: Vec::new(),
        }
    }

    /// The effective values: the unique value when one is set, otherwise all
    /// stored values.
    pub fn effective_values(&self) -> Vec<AttrValue> {
        match &self.unique_value {
            Some(value) => vec![value.clone()],
            None => self.values.clone(),
        }
    }
}

/// A user entity.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub key: String,
    pub username: String,
    /// Full path of the realm this user lives in.
    pub realm: String,
    pub password: Option<StoredPassword>,
    pub suspended: bool,
    pub must_change_password: bool,
    pub status: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_change_date: Option<DateTime<Utc>>,
    pub creator: Option<String>,
    pub last_modifier: Option<String>,
    pub failed_logins: i64,
    /// Keys of the roles assigned to this user.
    pub roles: Vec<String>,
    pub plain_attrs: Vec<PlainAttr>,
    pub memberships: Vec<Membership>,
    pub relationships: Vec<Relationship>,
    pub linked_accounts: Vec<LinkedAccount>,
}

impl User {
    pub fn new(key: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            username: username.into(),
            realm: "/".to_owned(),
            password: None,
            suspended: false,
            must_change_password: false,
            status: None,
            creation_date: None,
            last_change_date: None,
            creator: None,
            last_modifier: None,
            failed_logins: 0,
            roles: Vec::new(),
            plain_attrs: Vec::new(),
            memberships: Vec::new(),
            relationships: Vec::new(),
            linked_accounts: Vec::new(),
        }
    }
}

/// A group entity. Groups can be owned by a user or by another group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub name: String,
    pub realm: String,
    /// Key of the owning user, if any.
    pub user_owner: Option<String>,
    /// Key of the owning group, if any.
    pub group_owner: Option<String>,
    pub status: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_change_date: Option<DateTime<Utc>>,
    pub creator: Option<String>,
    pub last_modifier: Option<String>,
    pub plain_attrs: Vec<PlainAttr>,
}

impl Group {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            realm: "/".to_owned(),
            user_owner: None,
            group_owner: None,
            status: None,
            creation_date: None,
            last_change_date: None,
            creator: None,
            last_modifier: None,
            plain_attrs: Vec::new(),
        }
    }
}

/// A typed "any object" entity (printer, workstation, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct AnyObject {
    pub key: String,
    pub name: String,
    /// Key of the any-type this object belongs to.
    pub any_type: String,
    pub realm: String,
    pub status: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_change_date: Option<DateTime<Utc>>,
    pub creator: Option<String>,
    pub last_modifier: Option<String>,
    pub plain_attrs: Vec<PlainAttr>,
    pub memberships: Vec<Membership>,
    pub relationships: Vec<Relationship>,
}

impl AnyObject {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        any_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            any_type: any_type.into(),
            realm: "/".to_owned(),
            status: None,
            creation_date: None,
            last_change_date: None,
            creator: None,
            last_modifier: None,
            plain_attrs: Vec::new(),
            memberships: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

/// A realm node in the realm tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Realm {
    pub key: String,
    pub name: String,
    /// Full path from the root, e.g. `/even/two`.
    pub full_path: String,
    /// Full path of the parent realm; `None` for the root realm.
    pub parent: Option<String>,
}

/// Tagged union over the three entity kinds.
///
/// Graph lookups return owned snapshots, so this type is owned and cloneable;
/// the resolver borrows it wherever possible.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEntity {
    User(User),
    Group(Group),
    AnyObject(AnyObject),
}

impl AnyEntity {
    pub fn kind(&self) -> AnyTypeKind {
        match self {
            Self::User(_) => AnyTypeKind::User,
            Self::Group(_) => AnyTypeKind::Group,
            Self::AnyObject(_) => AnyTypeKind::AnyObject,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::User(u) => &u.key,
            Self::Group(g) => &g.key,
            Self::AnyObject(a) => &a.key,
        }
    }

    /// Display name: username for users, name for groups and any objects.
    pub fn name(&self) -> &str {
        match self {
            Self::User(u) => &u.username,
            Self::Group(g) => &g.name,
            Self::AnyObject(a) => &a.name,
        }
    }

    /// Full path of the entity's realm.
    pub fn realm(&self) -> &str {
        match self {
            Self::User(u) => &u.realm,
            Self::Group(g) => &g.realm,
            Self::AnyObject(a) => &a.realm,
        }
    }

    /// Key of the any-type this entity belongs to; the fixed kind names for
    /// users and groups.
    pub fn type_key(&self) -> &str {
        match self {
            Self::User(_) => "USER",
            Self::Group(_) => "GROUP",
            Self::AnyObject(a) => &a.any_type,
        }
    }

    pub fn plain_attrs(&self) -> &[PlainAttr] {
        match self {
            Self::User(u) => &u.plain_attrs,
            Self::Group(g) => &g.plain_attrs,
            Self::AnyObject(a) => &a.plain_attrs,
        }
    }

    pub fn plain_attr(&self, schema: &str) -> Option<&PlainAttr> {
        self.plain_attrs().iter().find(|a| a.schema == schema)
    }

    /// Memberships, for the kinds that can be group members.
    pub fn memberships(&self) -> &[Membership] {
        match self {
            Self::User(u) => &u.memberships,
            Self::AnyObject(a) => &a.memberships,
            Self::Group(_) => &[],
        }
    }

    pub fn membership_of(&self, group_key: &str) -> Option<&Membership> {
        self.memberships().iter().find(|m| m.group_key == group_key)
    }

    /// Relationships, for the kinds that can be related to other entities.
    pub fn relationships(&self) -> &[Relationship] {
        match self {
            Self::User(u) => &u.relationships,
            Self::AnyObject(a) => &a.relationships,
            Self::Group(_) => &[],
        }
    }

    /// Whether this kind participates in memberships and relationships.
    pub fn is_groupable(&self) -> bool {
        !matches!(self, Self::Group(_))
    }

    /// Read one of the enumerated generic fields.
    ///
    /// Returns `None` both for fields the kind does not carry and for names
    /// outside the table: the resolver logs and skips in either case.
    /// Special-cased fields (key, username, realm, password, owners,
    /// suspended, mustChangePassword) are handled by the resolver directly
    /// and not served here.
    pub fn read_field(&self, field: &str) -> Option<AttrValue> {
        match field {
            "name" => match self {
                Self::Group(g) => Some(AttrValue::String(g.name.clone())),
                Self::AnyObject(a) => Some(AttrValue::String(a.name.clone())),
                Self::User(_) => None,
            },
            "status" => self.status_field().map(AttrValue::String),
            "creationDate" => self.creation_date_field().map(AttrValue::Date),
            "lastChangeDate" => self.last_change_date_field().map(AttrValue::Date),
            "creator" => self.creator_field().map(AttrValue::String),
            "lastModifier" => self.last_modifier_field().map(AttrValue::String),
            "failedLogins" => match self {
                Self::User(u) => Some(AttrValue::Long(u.failed_logins)),
                _ => None,
            },
            _ => None,
        }
    }

    fn status_field(&self) -> Option<String> {
        match self {
            Self::User(u) => u.status.clone(),
            Self::Group(g) => g.status.clone(),
            Self::AnyObject(a) => a.status.clone(),
        }
    }

    fn creation_date_field(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::User(u) => u.creation_date,
            Self::Group(g) => g.creation_date,
            Self::AnyObject(a) => a.creation_date,
        }
    }

    fn last_change_date_field(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::User(u) => u.last_change_date,
            Self::Group(g) => g.last_change_date,
            Self::AnyObject(a) => a.last_change_date,
        }
    }

    fn creator_field(&self) -> Option<String> {
        match self {
            Self::User(u) => u.creator.clone(),
            Self::Group(g) => g.creator.clone(),
            Self::AnyObject(a) => a.creator.clone(),
        }
    }

    fn last_modifier_field(&self) -> Option<String> {
        match self {
            Self::User(u) => u.last_modifier.clone(),
            Self::Group(g) => g.last_modifier.clone(),
            Self::AnyObject(a) => a.last_modifier.clone(),
        }
    }
}

impl fmt::Display for AnyEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.key())
    }
}

impl From<User> for AnyEntity {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

impl From<Group> for AnyEntity {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

impl From<AnyObject> for AnyEntity {
    fn from(any_object: AnyObject) -> Self {
        Self::AnyObject(any_object)
    }
}
