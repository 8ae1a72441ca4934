//! Pull assembly: writing connector attributes back into internal drafts.
//!
//! The reverse of push: a pulled external attribute runs through the item's
//! pull-direction transformer chain, then lands on the draft according to
//! the reference's field/schema classification. Known fields map to
//! dedicated draft properties; schema references append generic entries,
//! attached to a membership draft when the reference carries a
//! membership-group traversal. Virtual entries always take the original,
//! untransformed values.

use log::{error, warn};

use super::MappingEngine;
use crate::external::ExternalAttr;
use crate::graph::IdentityGraph;
use crate::mapping::{AttrRef, MappingItem, OrgUnitItem, Traversal};
use crate::model::{
    AnyDraft, AttrValue, DraftAttr, OWNER_SENTINEL_SCHEMA, RealmDraft, parse_bool,
};
use crate::schema::SchemaKind;
use crate::transform::ItemRef;

impl<G: IdentityGraph> MappingEngine<G> {
    /// Apply one pulled external attribute to an internal draft.
    pub fn set_int_values(
        &self,
        item: &MappingItem,
        attr: Option<&ExternalAttr>,
        draft: &mut AnyDraft,
    ) {
        let values = match attr {
            Some(attr) => self
                .transformers
                .apply_pull(ItemRef::from(item), attr.values.clone()),
            None => Vec::new(),
        };

        let reference = match AttrRef::parse(&item.int_attr_name, draft.kind(), &self.schemas) {
            Ok(reference) => reference,
            Err(e) => {
                error!("Invalid intAttrName '{}' specified, ignoring: {}", item.int_attr_name, e);
                return;
            }
        };

        if let Some(field) = reference.field() {
            self.set_field_value(field, attr.is_some(), &values, draft);
        } else if let Some((kind, key)) = reference.schema() {
            let Some(attr) = attr else {
                return;
            };

            let entry = match kind {
                SchemaKind::Plain => DraftAttr {
                    schema: key.to_owned(),
                    values: values.iter().map(AttrValue::as_string).collect(),
                },
                // derived values are computed internally; only the schema
                // key is recorded
                SchemaKind::Derived => DraftAttr::new(key),
                // virtual attributes don't get transformed, take the
                // original values
                SchemaKind::Virtual => DraftAttr {
                    schema: key.to_owned(),
                    values: attr.values.iter().map(AttrValue::as_string).collect(),
                },
            };

            if let Some(Traversal::MembershipOfGroup(group_name)) = reference.traversal() {
                match self.graph.find_group_by_name(group_name) {
                    Some(group) => {
                        if let Some(membership) = draft.membership_mut(&group.key) {
                            match kind {
                                SchemaKind::Plain => membership.plain_attrs.push(entry),
                                SchemaKind::Derived => membership.der_attrs.push(entry),
                                SchemaKind::Virtual => membership.vir_attrs.push(entry),
                            }
                            return;
                        }
                    }
                    None => warn!("No group {}, falling back to entity level", group_name),
                }
            }

            match kind {
                SchemaKind::Plain => draft.plain_attrs_mut().push(entry),
                SchemaKind::Derived => draft.der_attrs_mut().push(entry),
                SchemaKind::Virtual => draft.vir_attrs_mut().push(entry),
            }
        }
    }

    /// Apply one pulled external attribute to a realm draft.
    ///
    /// Realms expose only `name` and `fullpath` on pull; a pulled full path
    /// resolves its parent realm by stripping the last path segment. An
    /// unresolvable parent is logged and the field left unset.
    pub fn set_realm_int_values(
        &self,
        item: &OrgUnitItem,
        attr: Option<&ExternalAttr>,
        draft: &mut RealmDraft,
    ) {
        let values = match attr {
            Some(attr) => self
                .transformers
                .apply_pull(ItemRef::from(item), attr.values.clone()),
            None => Vec::new(),
        };

        let Some(first) = values.first() else {
            return;
        };

        match item.int_attr_name.as_str() {
            "name" => draft.name = Some(first.as_string()),

            "fullpath" => {
                let full_path = first.as_string();
                let parent_path = full_path
                    .rsplit_once('/')
                    .map(|(head, _)| head)
                    .unwrap_or_default();
                match self.graph.find_realm_by_full_path(parent_path) {
                    Some(parent) => draft.parent = Some(parent.full_path),
                    None => warn!("Could not find Realm with path {}, ignoring", parent_path),
                }
            }

            _ => {}
        }
    }

    fn set_field_value(
        &self,
        field: &str,
        attr_present: bool,
        values: &[AttrValue],
        draft: &mut AnyDraft,
    ) {
        match field {
            "password" => {
                if let AnyDraft::User(user) = draft {
                    if let Some(first) = values.first() {
                        user.password = Some(first.as_string());
                    }
                }
            }

            "username" => {
                if let AnyDraft::User(user) = draft {
                    user.username = values.first().map(AttrValue::as_string);
                }
            }

            "name" => match draft {
                AnyDraft::Group(group) => {
                    group.name = values.first().map(AttrValue::as_string);
                }
                AnyDraft::AnyObject(any_object) => {
                    any_object.name = values.first().map(AttrValue::as_string);
                }
                AnyDraft::User(_) => {}
            },

            "mustChangePassword" => {
                if let AnyDraft::User(user) = draft {
                    if let Some(first) = values.first() {
                        user.must_change_password = Some(parse_bool(&first.as_string()));
                    }
                }
            }

            // the owner arrives as a connector name needing a second
            // resolution pass, stash it under the sentinel schema key
            "userOwner" | "groupOwner" => {
                if let AnyDraft::Group(group) = draft {
                    if attr_present {
                        let mut owner = DraftAttr::new(OWNER_SENTINEL_SCHEMA);
                        owner
                            .values
                            .push(values.first().map(AttrValue::as_string).unwrap_or_default());
                        group.plain_attrs.push(owner);
                    }
                }
            }

            _ => {}
        }
    }
}
