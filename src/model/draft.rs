//! Pull-direction drafts: internal representations assembled from connector
//! attributes.
//!
//! During reconciliation the engine does not touch stored entities directly;
//! it fills one of these mutable drafts, which the pull task layer then turns
//! into create/update operations. Drafts accumulate attribute entries in
//! string form (binary values arrive base64-encoded).

use super::entity::AnyTypeKind;

/// Sentinel schema key used to stash a pulled group-owner value.
///
/// The owner arrives as a connector name that needs a second resolution pass,
/// so it cannot be written to a real field yet.
pub const OWNER_SENTINEL_SCHEMA: &str = "";

/// A generic attribute entry on a draft: schema key plus string values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftAttr {
    pub schema: String,
    pub values: Vec<String>,
}

impl DraftAttr {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            values: Vec::new(),
        }
    }
}

/// Membership entry on a draft, with its own attribute lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MembershipDraft {
    pub group_key: String,
    pub plain_attrs: Vec<DraftAttr>,
    pub der_attrs: Vec<DraftAttr>,
    pub vir_attrs: Vec<DraftAttr>,
}

impl MembershipDraft {
    pub fn new(group_key: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            ..Default::default()
        }
    }
}

/// Draft of a pulled user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserDraft {
    pub username: Option<String>,
    pub password: Option<String>,
    pub must_change_password: Option<bool>,
    pub plain_attrs: Vec<DraftAttr>,
    pub der_attrs: Vec<DraftAttr>,
    pub vir_attrs: Vec<DraftAttr>,
    pub memberships: Vec<MembershipDraft>,
}

/// Draft of a pulled group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupDraft {
    pub name: Option<String>,
    pub plain_attrs: Vec<DraftAttr>,
    pub der_attrs: Vec<DraftAttr>,
    pub vir_attrs: Vec<DraftAttr>,
}

/// Draft of a pulled any object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnyObjectDraft {
    pub name: Option<String>,
    pub plain_attrs: Vec<DraftAttr>,
    pub der_attrs: Vec<DraftAttr>,
    pub vir_attrs: Vec<DraftAttr>,
    pub memberships: Vec<MembershipDraft>,
}

/// Draft of a pulled realm.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RealmDraft {
    pub name: Option<String>,
    /// Full path of the parent realm, resolved from a pulled `fullpath`.
    pub parent: Option<String>,
}

/// Tagged union over the entity drafts.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDraft {
    User(UserDraft),
    Group(GroupDraft),
    AnyObject(AnyObjectDraft),
}

impl AnyDraft {
    pub fn new(kind: AnyTypeKind) -> Self {
        match kind {
            AnyTypeKind::User => Self::User(UserDraft::default()),
            AnyTypeKind::Group => Self::Group(GroupDraft::default()),
            AnyTypeKind::AnyObject => Self::AnyObject(AnyObjectDraft::default()),
        }
    }

    pub fn kind(&self) -> AnyTypeKind {
        match self {
            Self::User(_) => AnyTypeKind::User,
            Self::Group(_) => AnyTypeKind::Group,
            Self::AnyObject(_) => AnyTypeKind::AnyObject,
        }
    }

    pub fn plain_attrs_mut(&mut self) -> &mut Vec<DraftAttr> {
        match self {
            Self::User(d) => &mut d.plain_attrs,
            Self::Group(d) => &mut d.plain_attrs,
            Self::AnyObject(d) => &mut d.plain_attrs,
        }
    }

    pub fn der_attrs_mut(&mut self) -> &mut Vec<DraftAttr> {
        match self {
            Self::User(d) => &mut d.der_attrs,
            Self::Group(d) => &mut d.der_attrs,
            Self::AnyObject(d) => &mut d.der_attrs,
        }
    }

    pub fn vir_attrs_mut(&mut self) -> &mut Vec<DraftAttr> {
        match self {
            Self::User(d) => &mut d.vir_attrs,
            Self::Group(d) => &mut d.vir_attrs,
            Self::AnyObject(d) => &mut d.vir_attrs,
        }
    }

    /// The membership entry for the given group, created on demand.
    ///
    /// Groups have no memberships; `None` for them.
    pub fn membership_mut(&mut self, group_key: &str) -> Option<&mut MembershipDraft> {
        let memberships = match self {
            Self::User(d) => &mut d.memberships,
            Self::AnyObject(d) => &mut d.memberships,
            Self::Group(_) => return None,
        };
        if let Some(pos) = memberships.iter().position(|m| m.group_key == group_key) {
            return memberships.get_mut(pos);
        }
        memberships.push(MembershipDraft::new(group_key));
        memberships.last_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_created_on_demand() {
        let mut draft = AnyDraft::new(AnyTypeKind::User);
        {
            let membership = draft.membership_mut("g1").unwrap();
            membership.plain_attrs.push(DraftAttr::new("badge"));
        }
        // second access reuses the same entry
        let membership = draft.membership_mut("g1").unwrap();
        assert_eq!(membership.plain_attrs.len(), 1);

        let AnyDraft::User(user) = draft else {
            panic!("expected user draft")
        };
        assert_eq!(user.memberships.len(), 1);
    }

    #[test]
    fn test_groups_have_no_membership_drafts() {
        let mut draft = AnyDraft::new(AnyTypeKind::Group);
        assert!(draft.membership_mut("g1").is_none());
    }
}
