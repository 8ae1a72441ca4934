//! Push assembly: building the external attribute set for propagation.
//!
//! Items are processed in declaration order and merged into an
//! [`AttributeSet`] whose merge unions values under the same external name.
//! The connector-key item feeds the returned key and the synthesized
//! `__NAME__` attribute; password items follow a strict source priority
//! (caller-supplied, then decodable stored credential, then policy-driven
//! random generation); a `change_password == false` call never lets a
//! password reach the connector.

use log::{debug, error, warn};

use super::{
    AccountGetter, DefaultAccountGetter, DefaultPlainAttrGetter, LinkedPasswordGetter,
    LinkedPlainAttrGetter, LinkedUsernameGetter, MappingEngine, PlainAttrGetter,
};
use crate::external::{AttributeSet, ExternalAttr, names};
use crate::graph::IdentityGraph;
use crate::mapping::{AttrRef, MappingItem, OrgUnit, OrgUnitItem, Provision};
use crate::model::{
    AccountView, AnyEntity, AttrSchemaType, AttrValue, LinkedAccount, Realm, User,
};
use crate::schema::SchemaKind;

/// Outcome of resolving one mapping item for push.
///
/// Connector-key items contribute the key and no attribute; all other items
/// contribute an attribute and no key.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAttr {
    pub conn_object_key: Option<String>,
    pub attr: Option<ExternalAttr>,
}

impl<G: IdentityGraph> MappingEngine<G> {
    /// Build the full external attribute set for pushing an entity.
    ///
    /// Returns the resolved connector key (when a connector-key item is
    /// configured and produced a value) together with the attribute set.
    /// Failures of individual items are logged and skipped; they never block
    /// the remaining items.
    pub fn prepare_attrs(
        &self,
        root: &AnyEntity,
        password: Option<&str>,
        change_password: bool,
        enable: Option<bool>,
        provision: &Provision,
    ) -> (Option<String>, AttributeSet) {
        debug!("Preparing resource attributes for {} with provision on {}",
            root, provision.resource.key);

        let mut attrs = AttributeSet::new();
        let mut conn_object_key: Option<String> = None;

        for item in provision.mapping.propagation_items() {
            debug!("Processing expression '{}'", item.int_attr_name);

            let prepared = self.prepare_attr(
                provision,
                item,
                root,
                password,
                &DefaultAccountGetter,
                &DefaultAccountGetter,
                &DefaultPlainAttrGetter,
            );
            if let Some(key) = process_prepared_attr(prepared, &mut attrs) {
                conn_object_key = Some(key);
            }
        }

        self.apply_conn_object_key(root, provision, conn_object_key.as_deref(), &mut attrs);

        if let Some(enable) = enable {
            attrs.replace(ExternalAttr::enabled(enable));
        }
        if !change_password {
            // password changes that weren't requested must never reach the
            // connector
            attrs.remove(names::PASSWORD);
        }

        (conn_object_key, attrs)
    }

    /// Build the external attribute set for pushing a linked account.
    ///
    /// Resolution runs against the owning user with the account's overrides
    /// injected through the account and plain-attribute getters; connector
    /// key and enable flag come from the account's own stored state.
    pub fn prepare_account_attrs(
        &self,
        user: &User,
        account: &LinkedAccount,
        password: Option<&str>,
        change_password: bool,
        provision: &Provision,
    ) -> AttributeSet {
        debug!(
            "Preparing resource attributes for linked account {} of user {}",
            account.key, user.key
        );

        let root = AnyEntity::User(user.clone());
        let username_getter = LinkedUsernameGetter { account };
        let password_getter = LinkedPasswordGetter { account };
        let plain_attr_getter = LinkedPlainAttrGetter { account };

        let mut attrs = AttributeSet::new();

        for item in provision.mapping.propagation_items() {
            debug!("Processing expression '{}'", item.int_attr_name);

            let prepared = self.prepare_attr(
                provision,
                item,
                &root,
                password,
                &username_getter,
                &password_getter,
                &plain_attr_getter,
            );
            process_prepared_attr(prepared, &mut attrs);
        }

        // the account's stored connector key wins over any freshly resolved
        // one; a missing stored value degrades like the entity path
        match &account.conn_object_key_value {
            Some(key) => {
                self.apply_conn_object_key(&root, provision, Some(key), &mut attrs);
            }
            None => warn!(
                "No connector key value stored for linked account {}, skipping",
                account.key
            ),
        }

        if let Some(suspended) = account.suspended {
            attrs.replace(ExternalAttr::enabled(!suspended));
        }
        if !change_password {
            attrs.remove(names::PASSWORD);
        }

        attrs
    }

    /// Build the external attribute set for pushing a realm through an
    /// org-unit mapping.
    pub fn prepare_realm_attrs(
        &self,
        realm: &Realm,
        org_unit: &OrgUnit,
    ) -> (Option<String>, AttributeSet) {
        debug!("Preparing resource attributes for realm {}", realm.full_path);

        let mut attrs = AttributeSet::new();
        let mut conn_object_key: Option<String> = None;

        for item in org_unit.propagation_items() {
            debug!("Processing expression '{}'", item.int_attr_name);

            let value = realm_int_value(realm, item);
            if item.conn_object_key {
                conn_object_key = value.clone();
            }

            match value {
                Some(value) => {
                    attrs.merge(ExternalAttr::single(
                        &item.ext_attr_name,
                        AttrValue::String(value),
                    ));
                }
                None => {
                    if !attrs.contains(&item.ext_attr_name) {
                        attrs.merge(ExternalAttr::empty(&item.ext_attr_name));
                    }
                }
            }
        }

        if let Some(key_item) = org_unit.conn_object_key_item() {
            if attrs.contains(&key_item.ext_attr_name) {
                attrs.replace(canonical_key_attr(
                    &key_item.ext_attr_name,
                    conn_object_key.as_deref(),
                ));
            }
            let key = conn_object_key.as_deref().unwrap_or_default();
            let name = match &org_unit.obj_link {
                Some(link) => {
                    let evaluated = link.evaluate_realm(realm, key);
                    if evaluated.is_empty() {
                        key.to_owned()
                    } else {
                        evaluated
                    }
                }
                None => key.to_owned(),
            };
            attrs.replace(ExternalAttr::object_name(name));
        }

        (conn_object_key, attrs)
    }

    /// Resolve a single mapping item into its prepared form.
    ///
    /// `None` means the item contributes nothing: unparseable expression,
    /// read-only virtual schema, or an unavailable password.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_attr(
        &self,
        provision: &Provision,
        item: &MappingItem,
        root: &AnyEntity,
        password: Option<&str>,
        username_getter: &dyn AccountGetter,
        password_getter: &dyn AccountGetter,
        plain_attr_getter: &dyn PlainAttrGetter,
    ) -> Option<PreparedAttr> {
        let reference = match AttrRef::parse(&item.int_attr_name, provision.any_type, &self.schemas)
        {
            Ok(reference) => reference,
            Err(e) => {
                error!("Invalid intAttrName '{}' specified, ignoring: {}", item.int_attr_name, e);
                return None;
            }
        };

        let schema_type = match reference.schema() {
            Some((SchemaKind::Plain, key)) => self
                .schemas
                .plain(key)
                .map(|schema| schema.value_type)
                .unwrap_or_default(),
            _ => AttrSchemaType::String,
        };
        let readonly_vir_schema = matches!(
            reference.schema(),
            Some((SchemaKind::Virtual, key))
                if self.schemas.virtual_schema(key).is_some_and(|schema| schema.readonly)
        );

        let (schema_type, values) = self.int_values(
            provision,
            item,
            &reference,
            schema_type,
            root,
            username_getter,
            plain_attr_getter,
        );

        debug!(
            "Define mapping for: ExtAttrName {}, connObjectKey {}, password {}, schema type {}, values {:?}",
            item.ext_attr_name, item.conn_object_key, item.password, schema_type, values
        );

        if readonly_vir_schema {
            return None;
        }

        let conn_values: Vec<AttrValue> =
            values.into_iter().map(AttrValue::into_conn_value).collect();

        if item.conn_object_key {
            return Some(PreparedAttr {
                conn_object_key: conn_values.first().map(AttrValue::as_string),
                attr: None,
            });
        }

        if item.password {
            if let AnyEntity::User(user) = root {
                let account = password_getter.select(user);
                return self
                    .password_attr_value(provision, &account, password)
                    .map(|plaintext| PreparedAttr {
                        conn_object_key: None,
                        attr: Some(ExternalAttr::password(plaintext)),
                    });
            }
            return None;
        }

        Some(PreparedAttr {
            conn_object_key: None,
            attr: Some(if conn_values.is_empty() {
                ExternalAttr::empty(&item.ext_attr_name)
            } else {
                ExternalAttr::new(&item.ext_attr_name, conn_values)
            }),
        })
    }

    /// The connector key value for an entity under a provision, resolved
    /// from the configured connector-key item.
    pub fn conn_object_key_value(
        &self,
        entity: &AnyEntity,
        provision: &Provision,
    ) -> Option<String> {
        let item = provision.mapping.conn_object_key_item()?;
        let values = match AttrRef::parse(&item.int_attr_name, provision.any_type, &self.schemas) {
            Ok(reference) => {
                self.int_values(
                    provision,
                    item,
                    &reference,
                    AttrSchemaType::String,
                    entity,
                    &DefaultAccountGetter,
                    &DefaultPlainAttrGetter,
                )
                .1
            }
            Err(e) => {
                error!("Invalid intAttrName '{}' specified, ignoring: {}", item.int_attr_name, e);
                Vec::new()
            }
        };
        values.first().map(AttrValue::as_string)
    }

    /// The connector key value for a realm under an org-unit mapping.
    pub fn realm_conn_object_key_value(&self, realm: &Realm, org_unit: &OrgUnit) -> Option<String> {
        org_unit
            .conn_object_key_item()
            .and_then(|item| realm_int_value(realm, item))
    }

    /// The `__NAME__` value a group owner propagates under: the owner's own
    /// connector key run through the provision's object link.
    pub(crate) fn group_owner_value(
        &self,
        provision: &Provision,
        owner: &AnyEntity,
    ) -> Option<String> {
        let key_item = provision.mapping.conn_object_key_item()?;
        let prepared = self.prepare_attr(
            provision,
            key_item,
            owner,
            None,
            &DefaultAccountGetter,
            &DefaultAccountGetter,
            &DefaultPlainAttrGetter,
        )?;
        Some(self.evaluate_name(owner, provision, prepared.conn_object_key.as_deref()))
    }

    /// Rewrite the connector-key attribute to its canonical value and
    /// synthesize `__NAME__`.
    fn apply_conn_object_key(
        &self,
        root: &AnyEntity,
        provision: &Provision,
        conn_object_key: Option<&str>,
        attrs: &mut AttributeSet,
    ) {
        let Some(key_item) = provision.mapping.conn_object_key_item() else {
            return;
        };

        let existed = attrs.contains(&key_item.ext_attr_name);
        if existed {
            attrs.replace(canonical_key_attr(&key_item.ext_attr_name, conn_object_key));
        }

        let name = self.evaluate_name(root, provision, conn_object_key);
        attrs.replace(ExternalAttr::object_name(name.clone()));

        // when the object name differs from the key, the key still has to
        // travel under its own external attribute
        if let Some(key) = conn_object_key {
            if key != name && !existed {
                attrs.replace(ExternalAttr::single(
                    &key_item.ext_attr_name,
                    AttrValue::String(key.to_owned()),
                ));
            }
        }
    }

    fn evaluate_name(
        &self,
        entity: &AnyEntity,
        provision: &Provision,
        conn_object_key: Option<&str>,
    ) -> String {
        let key = conn_object_key.unwrap_or_default();
        if key.is_empty() {
            warn!("Empty connector key for {}", entity);
        }
        match &provision.obj_link {
            Some(link) => {
                let evaluated = link.evaluate(entity, key);
                if evaluated.is_empty() {
                    key.to_owned()
                } else {
                    evaluated
                }
            }
            None => key.to_owned(),
        }
    }

    /// Resolve the plaintext to push for a password item, in priority order:
    /// caller-supplied, then the account's decodable stored credential, then
    /// policy-driven random generation when the resource permits it.
    fn password_attr_value(
        &self,
        provision: &Provision,
        account: &AccountView,
        default_value: Option<&str>,
    ) -> Option<String> {
        if let Some(value) = default_value {
            if !value.trim().is_empty() {
                return Some(value.to_owned());
            }
        }

        if let Some(stored) = account.password.as_ref().filter(|p| p.can_decode()) {
            match self.cipher.decode(stored) {
                Ok(plaintext) => return Some(plaintext),
                Err(e) => error!("Could not decode password: {}", e),
            }
        } else if provision.resource.random_pwd_if_not_provided {
            match self.password_generator.generate(&provision.resource) {
                Ok(plaintext) => return Some(plaintext),
                Err(e) => error!(
                    "Could not generate policy-compliant random password: {}",
                    e
                ),
            }
        }

        None
    }
}

fn process_prepared_attr(
    prepared: Option<PreparedAttr>,
    attrs: &mut AttributeSet,
) -> Option<String> {
    let prepared = prepared?;
    if let Some(attr) = prepared.attr {
        attrs.merge(attr);
    }
    prepared.conn_object_key
}

fn canonical_key_attr(ext_attr_name: &str, conn_object_key: Option<&str>) -> ExternalAttr {
    match conn_object_key {
        Some(key) => ExternalAttr::single(ext_attr_name, AttrValue::String(key.to_owned())),
        None => ExternalAttr::empty(ext_attr_name),
    }
}

fn realm_int_value(realm: &Realm, item: &OrgUnitItem) -> Option<String> {
    match item.int_attr_name.as_str() {
        "key" => Some(realm.key.clone()),
        "name" => Some(realm.name.clone()),
        "fullpath" => Some(realm.full_path.clone()),
        _ => None,
    }
}
