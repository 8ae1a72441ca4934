//! Linked accounts: secondary credentials owned by a user.
//!
//! A linked account overrides selected values of its owning user when
//! propagating to the resource it belongs to: username, password, suspension
//! state, plain attributes and the stored connector key. Overrides are
//! layered — any value the account does not carry falls back to the owner.

use super::entity::{PlainAttr, StoredPassword, User};

/// A secondary account record owned by a user, bound to one resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkedAccount {
    pub key: String,
    /// Connector key value stored when the account was provisioned or pulled.
    pub conn_object_key_value: Option<String>,
    pub username: Option<String>,
    pub password: Option<StoredPassword>,
    pub suspended: Option<bool>,
    pub plain_attrs: Vec<PlainAttr>,
}

impl LinkedAccount {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn plain_attr(&self, schema: &str) -> Option<&PlainAttr> {
        self.plain_attrs.iter().find(|a| a.schema == schema)
    }
}

/// Snapshot of the account record selected to supply username and password
/// during resolution — either the user itself or one of its linked accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub username: Option<String>,
    pub password: Option<StoredPassword>,
}

impl AccountView {
    /// View over the user's own username and credential.
    pub fn of_user(user: &User) -> Self {
        Self {
            username: Some(user.username.clone()),
            password: user.password.clone(),
        }
    }

    /// View over a linked account's own values, no fallback applied.
    pub fn of_account(account: &LinkedAccount) -> Self {
        Self {
            username: account.username.clone(),
            password: account.password.clone(),
        }
    }

    pub fn can_decode_password(&self) -> bool {
        self.password.as_ref().is_some_and(StoredPassword::can_decode)
    }
}
