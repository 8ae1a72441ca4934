//! Memberships, relationships, roles and privileges.

use super::entity::PlainAttr;

/// A group membership held by a user or any object.
///
/// Carries membership-scoped plain attribute overrides: when a mapping item
/// binds a membership context, plain/derived/virtual lookups are served from
/// here instead of from the entity's own attribute list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Membership {
    pub group_key: String,
    pub plain_attrs: Vec<PlainAttr>,
}

impl Membership {
    pub fn new(group_key: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            plain_attrs: Vec::new(),
        }
    }

    pub fn plain_attr(&self, schema: &str) -> Option<&PlainAttr> {
        self.plain_attrs.iter().find(|a| a.schema == schema)
    }
}

/// A typed relationship from one entity to another.
///
/// The right end is identified by its any-type key and entity key; the
/// resolver fetches the actual entity through the identity graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub relationship_type: String,
    pub right_end_type: String,
    pub right_end_key: String,
}

impl Relationship {
    pub fn new(
        relationship_type: impl Into<String>,
        right_end_type: impl Into<String>,
        right_end_key: impl Into<String>,
    ) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            right_end_type: right_end_type.into(),
            right_end_key: right_end_key.into(),
        }
    }
}

/// A privilege granted by a role, scoped to one application.
#[derive(Debug, Clone, PartialEq)]
pub struct Privilege {
    pub key: String,
    pub application: String,
}

impl Privilege {
    pub fn new(key: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            application: application.into(),
        }
    }
}

/// A role: a named bundle of privileges assignable to users.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Role {
    pub key: String,
    pub privileges: Vec<Privilege>,
}

impl Role {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            privileges: Vec::new(),
        }
    }

    /// Privileges this role grants for the given application.
    pub fn privileges_for(&self, application: &str) -> impl Iterator<Item = &Privilege> {
        self.privileges
            .iter()
            .filter(move |p| p.application == application)
    }
}

/// An application privileges can be scoped to.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub key: String,
    pub description: Option<String>,
}

impl Application {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileges_scoped_to_application() {
        let mut role = Role::new("auditor");
        role.privileges.push(Privilege::new("read", "ledger"));
        role.privileges.push(Privilege::new("write", "ledger"));
        role.privileges.push(Privilege::new("read", "billing"));

        let ledger: Vec<_> = role.privileges_for("ledger").map(|p| p.key.clone()).collect();
        assert_eq!(ledger, vec!["read", "write"]);
        assert_eq!(role.privileges_for("crm").count(), 0);
    }
}
