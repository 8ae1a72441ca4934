//! Internal value resolution: from a parsed reference and a root entity to
//! typed values.
//!
//! Resolution first determines the set of target entities to read from
//! (the root itself, or the entities a cross-entity traversal leads to),
//! then extracts and coerces values per target. Every graph miss along the
//! way degrades to "no value" with a warning; resolution itself never fails.

use log::{debug, warn};
use std::borrow::Cow;

use super::{AccountGetter, MappingEngine, PlainAttrGetter};
use crate::error::MappingError;
use crate::graph::IdentityGraph;
use crate::mapping::{AttrRef, MappingItem, Provision, Traversal};
use crate::model::{AnyEntity, AnyTypeKind, AttrSchemaType, AttrValue, Membership};
use crate::schema::SchemaKind;
use crate::transform::ItemRef;

impl<G: IdentityGraph> MappingEngine<G> {
    /// Resolve the internal values a mapping item contributes for an entity.
    ///
    /// Returns the possibly reclassified schema type together with the
    /// ordered resolved values, after running the item's transformer chain
    /// (skipped for virtual schema references). An empty value list is a
    /// normal outcome, never an error.
    pub fn int_values(
        &self,
        provision: &Provision,
        item: &MappingItem,
        reference: &AttrRef,
        schema_type: AttrSchemaType,
        root: &AnyEntity,
        username_getter: &dyn AccountGetter,
        plain_attr_getter: &dyn PlainAttrGetter,
    ) -> (AttrSchemaType, Vec<AttrValue>) {
        debug!(
            "Get internal values for {} as '{}' on {}",
            root, item.int_attr_name, provision.resource.key
        );

        let mut targets: Vec<Cow<'_, AnyEntity>> = Vec::new();
        let mut membership: Option<&Membership> = None;

        match reference.traversal() {
            None | Some(Traversal::MembershipOfGroup(_)) => targets.push(Cow::Borrowed(root)),
            _ => {}
        }

        if root.is_groupable() {
            match reference.traversal() {
                Some(Traversal::EnclosingGroup(name)) => {
                    match self.graph.find_group_by_name(name) {
                        Some(group) if root.membership_of(&group.key).is_some() => {
                            targets.push(Cow::Owned(AnyEntity::Group(group)));
                        }
                        _ => warn!("No membership for {} in {}, ignoring", name, root),
                    }
                }
                Some(Traversal::RelatedUser(username)) => {
                    match self.graph.find_user_by_username(username) {
                        Some(user)
                            if user
                                .relationships
                                .iter()
                                .any(|r| r.right_end_key == root.key()) =>
                        {
                            if root.kind() == AnyTypeKind::User {
                                warn!("Users cannot have relationship with other users, ignoring");
                            } else {
                                targets.push(Cow::Owned(AnyEntity::User(user)));
                            }
                        }
                        _ => warn!("No relationship for {} in {}, ignoring", username, root),
                    }
                }
                Some(Traversal::RelatedAnyObject(name)) => {
                    match self.graph.find_any_object_by_name(name) {
                        Some(any_object)
                            if root
                                .relationships()
                                .iter()
                                .any(|r| r.right_end_key == any_object.key) =>
                        {
                            targets.push(Cow::Owned(AnyEntity::AnyObject(any_object)));
                        }
                        _ => warn!("No relationship for {} in {}, ignoring", name, root),
                    }
                }
                Some(Traversal::RelationshipTyped {
                    any_type,
                    relationship_type,
                }) => {
                    let related: Vec<_> = root
                        .relationships()
                        .iter()
                        .filter(|r| &r.relationship_type == relationship_type)
                        .collect();
                    if !self.graph.relationship_type_exists(relationship_type)
                        || related.is_empty()
                    {
                        warn!(
                            "No relationship for type {} in {}, ignoring",
                            relationship_type, root
                        );
                    } else if !self.graph.any_type_exists(any_type) {
                        warn!("No anyType {}, ignoring", any_type);
                    } else {
                        for relationship in related {
                            if &relationship.right_end_type != any_type {
                                continue;
                            }
                            match self.graph.find_any_object_by_key(&relationship.right_end_key) {
                                Some(any_object) => {
                                    targets.push(Cow::Owned(AnyEntity::AnyObject(any_object)));
                                }
                                None => warn!(
                                    "Dangling relationship right end {}, ignoring",
                                    relationship.right_end_key
                                ),
                            }
                        }
                    }
                }
                Some(Traversal::MembershipOfGroup(name)) => {
                    match self.graph.find_group_by_name(name) {
                        Some(group) => membership = root.membership_of(&group.key),
                        None => warn!("No group {}, ignoring membership context", name),
                    }
                }
                None => {}
            }
        }

        if targets.is_empty() {
            warn!(
                "Could not determine the reference instance for {}",
                item.int_attr_name
            );
            return (schema_type, Vec::new());
        }

        let mut values: Vec<AttrValue> = Vec::new();
        let mut transform = true;

        for target in &targets {
            if let Some(field) = reference.field() {
                self.extract_field(provision, field, target, username_getter, &mut values);
            } else if let Some((kind, key)) = reference.schema() {
                match kind {
                    SchemaKind::Plain => {
                        let attr = match membership {
                            Some(m) => m.plain_attr(key).cloned(),
                            None => plain_attr_getter.plain_attr(target, key),
                        };
                        match attr {
                            Some(attr) => values.extend(attr.effective_values()),
                            None => warn!(
                                "Invalid PlainSchema {} or PlainAttr not found for {}",
                                key,
                                target.as_ref()
                            ),
                        }
                    }
                    SchemaKind::Derived => {
                        if let Some(schema) = self.schemas.derived(key) {
                            if let Some(value) =
                                self.der_evaluator.value(target, membership, schema)
                            {
                                values.push(AttrValue::String(value));
                            }
                        } else {
                            warn!("No DerSchema {}, ignoring", key);
                        }
                    }
                    SchemaKind::Virtual => {
                        // virtual attributes don't get transformed
                        transform = false;

                        if let Some(schema) = self.schemas.virtual_schema(key) {
                            debug!("Expire entry cache {}-{}", target.as_ref(), key);
                            self.vir_cache
                                .invalidate(target.type_key(), target.key(), key);

                            for value in self.vir_evaluator.values(target, membership, schema) {
                                values.push(AttrValue::String(value));
                            }
                        } else {
                            warn!("No VirSchema {}, ignoring", key);
                        }
                    }
                }
            } else if let AttrRef::Privileges { application } = reference {
                if let AnyEntity::User(user) = target.as_ref() {
                    match self.graph.find_application(application) {
                        Some(app) => {
                            for role in self.graph.roles_of(user) {
                                for privilege in role.privileges_for(&app.key) {
                                    values.push(AttrValue::String(privilege.key.clone()));
                                }
                            }
                        }
                        None => warn!("Invalid application: {}", application),
                    }
                }
            }
        }

        debug!("Internal values: {:?}", values);

        if transform {
            let (schema_type, values) = self.transformers.apply_propagation(
                ItemRef::from(item),
                root,
                schema_type,
                values,
            );
            debug!("Transformed values: {:?}", values);
            (schema_type, values)
        } else {
            debug!("No transformation occurred");
            (schema_type, values)
        }
    }

    fn extract_field(
        &self,
        provision: &Provision,
        field: &str,
        target: &AnyEntity,
        username_getter: &dyn AccountGetter,
        values: &mut Vec<AttrValue>,
    ) {
        match field {
            "key" => values.push(AttrValue::String(target.key().to_owned())),

            "username" => {
                if let AnyEntity::User(user) = target {
                    if let Some(username) = username_getter.select(user).username {
                        values.push(AttrValue::String(username));
                    }
                }
            }

            "realm" => values.push(AttrValue::String(target.realm().to_owned())),

            // never extracted here; the password item path handles credentials
            "password" => {}

            "userOwner" | "groupOwner" => {
                if let AnyEntity::Group(group) = target {
                    let mut owner_value = None;
                    if provision.any_type == AnyTypeKind::User {
                        if let Some(owner_key) = &group.user_owner {
                            owner_value = self
                                .graph
                                .find_user_by_key(owner_key)
                                .map(AnyEntity::User)
                                .and_then(|owner| self.group_owner_value(provision, &owner));
                        }
                    }
                    if provision.any_type == AnyTypeKind::Group {
                        if let Some(owner_key) = &group.group_owner {
                            owner_value = self
                                .graph
                                .find_group_by_key(owner_key)
                                .map(AnyEntity::Group)
                                .and_then(|owner| self.group_owner_value(provision, &owner));
                        }
                    }
                    match owner_value {
                        Some(value) if !value.is_empty() => {
                            values.push(AttrValue::String(value));
                        }
                        _ => {}
                    }
                }
            }

            "suspended" => {
                if let AnyEntity::User(user) = target {
                    values.push(AttrValue::Boolean(user.suspended));
                }
            }

            "mustChangePassword" => {
                if let AnyEntity::User(user) = target {
                    values.push(AttrValue::Boolean(user.must_change_password));
                }
            }

            other => match target.read_field(other) {
                Some(value) => values.push(value),
                None => warn!(
                    "{}",
                    MappingError::coercion(
                        other,
                        "attribute value",
                        format!("not an enumerated field of {}", target)
                    )
                ),
            },
        }
    }
}
