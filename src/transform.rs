//! Pluggable per-item value transformations.
//!
//! Each mapping item carries an ordered list of transformer identifiers,
//! resolved through a [`TransformerRegistry`] and applied strictly in
//! configured order: once before values leave for the connector
//! ([`ItemTransformer::before_propagation`]) and once before pulled values
//! are written into a draft ([`ItemTransformer::before_pull`]). Transformers
//! are black boxes to the engine; both hooks default to pass-through so an
//! implementation overrides only the direction it cares about.

use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

use crate::mapping::{MappingItem, OrgUnitItem};
use crate::model::{AnyEntity, AttrSchemaType, AttrValue};

/// Common view over entity mapping items and org-unit items.
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    Mapping(&'a MappingItem),
    OrgUnit(&'a OrgUnitItem),
}

impl<'a> ItemRef<'a> {
    pub fn int_attr_name(&self) -> &'a str {
        match self {
            Self::Mapping(item) => &item.int_attr_name,
            Self::OrgUnit(item) => &item.int_attr_name,
        }
    }

    pub fn ext_attr_name(&self) -> &'a str {
        match self {
            Self::Mapping(item) => &item.ext_attr_name,
            Self::OrgUnit(item) => &item.ext_attr_name,
        }
    }

    pub fn transformers(&self) -> &'a [String] {
        match self {
            Self::Mapping(item) => &item.transformers,
            Self::OrgUnit(item) => &item.transformers,
        }
    }
}

impl<'a> From<&'a MappingItem> for ItemRef<'a> {
    fn from(item: &'a MappingItem) -> Self {
        Self::Mapping(item)
    }
}

impl<'a> From<&'a OrgUnitItem> for ItemRef<'a> {
    fn from(item: &'a OrgUnitItem) -> Self {
        Self::OrgUnit(item)
    }
}

/// A value transformation attached to a mapping item.
///
/// Receives and returns the full `(schema type, values)` pair in push
/// direction, so it can reclassify the type as well as rewrite values.
pub trait ItemTransformer: Send + Sync {
    /// Applied before resolved values are assembled for the connector.
    fn before_propagation(
        &self,
        item: ItemRef<'_>,
        entity: &AnyEntity,
        schema_type: AttrSchemaType,
        values: Vec<AttrValue>,
    ) -> (AttrSchemaType, Vec<AttrValue>) {
        let _ = (item, entity);
        (schema_type, values)
    }

    /// Applied before pulled values are written into the internal draft.
    fn before_pull(&self, item: ItemRef<'_>, values: Vec<AttrValue>) -> Vec<AttrValue> {
        let _ = item;
        values
    }
}

/// Ordered lookup of transformer instances by configured identifier.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: HashMap<String, Arc<dyn ItemTransformer>>,
}

impl TransformerRegistry {
    /// Registry preloaded with the built-in transformers (`lowercase`,
    /// `uppercase`, `trim`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.register("lowercase", Arc::new(Lowercase));
        registry.register("uppercase", Arc::new(Uppercase));
        registry.register("trim", Arc::new(Trim));
        registry
    }

    pub fn register(&mut self, id: impl Into<String>, transformer: Arc<dyn ItemTransformer>) {
        self.transformers.insert(id.into(), transformer);
    }

    /// The transformer chain configured on an item, in declaration order.
    /// Unknown identifiers are skipped with a warning.
    pub fn chain_for(&self, item: ItemRef<'_>) -> Vec<Arc<dyn ItemTransformer>> {
        item.transformers()
            .iter()
            .filter_map(|id| {
                let found = self.transformers.get(id).cloned();
                if found.is_none() {
                    warn!("No transformer registered under '{}', skipping", id);
                }
                found
            })
            .collect()
    }

    /// Run the push-direction chain over the resolved values.
    pub fn apply_propagation(
        &self,
        item: ItemRef<'_>,
        entity: &AnyEntity,
        schema_type: AttrSchemaType,
        values: Vec<AttrValue>,
    ) -> (AttrSchemaType, Vec<AttrValue>) {
        let mut state = (schema_type, values);
        for transformer in self.chain_for(item) {
            state = transformer.before_propagation(item, entity, state.0, state.1);
        }
        state
    }

    /// Run the pull-direction chain over the incoming values.
    pub fn apply_pull(&self, item: ItemRef<'_>, values: Vec<AttrValue>) -> Vec<AttrValue> {
        let mut values = values;
        for transformer in self.chain_for(item) {
            values = transformer.before_pull(item, values);
        }
        values
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.transformers.keys().collect();
        ids.sort();
        f.debug_struct("TransformerRegistry").field("ids", &ids).finish()
    }
}

fn map_strings(values: Vec<AttrValue>, f: impl Fn(&str) -> String) -> Vec<AttrValue> {
    values
        .into_iter()
        .map(|value| match value {
            AttrValue::String(s) => AttrValue::String(f(&s)),
            other => other,
        })
        .collect()
}

/// Lower-cases string values in both directions.
pub struct Lowercase;

impl ItemTransformer for Lowercase {
    fn before_propagation(
        &self,
        _item: ItemRef<'_>,
        _entity: &AnyEntity,
        schema_type: AttrSchemaType,
        values: Vec<AttrValue>,
    ) -> (AttrSchemaType, Vec<AttrValue>) {
        (schema_type, map_strings(values, str::to_lowercase))
    }

    fn before_pull(&self, _item: ItemRef<'_>, values: Vec<AttrValue>) -> Vec<AttrValue> {
        map_strings(values, str::to_lowercase)
    }
}

/// Upper-cases string values in both directions.
pub struct Uppercase;

impl ItemTransformer for Uppercase {
    fn before_propagation(
        &self,
        _item: ItemRef<'_>,
        _entity: &AnyEntity,
        schema_type: AttrSchemaType,
        values: Vec<AttrValue>,
    ) -> (AttrSchemaType, Vec<AttrValue>) {
        (schema_type, map_strings(values, str::to_uppercase))
    }

    fn before_pull(&self, _item: ItemRef<'_>, values: Vec<AttrValue>) -> Vec<AttrValue> {
        map_strings(values, str::to_uppercase)
    }
}

/// Trims surrounding whitespace from string values in both directions.
pub struct Trim;

impl ItemTransformer for Trim {
    fn before_propagation(
        &self,
        _item: ItemRef<'_>,
        _entity: &AnyEntity,
        schema_type: AttrSchemaType,
        values: Vec<AttrValue>,
    ) -> (AttrSchemaType, Vec<AttrValue>) {
        (schema_type, map_strings(values, |s| s.trim().to_owned()))
    }

    fn before_pull(&self, _item: ItemRef<'_>, values: Vec<AttrValue>) -> Vec<AttrValue> {
        map_strings(values, |s| s.trim().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    fn item_with(transformers: &[&str]) -> MappingItem {
        let mut item = MappingItem::new("email", "mail");
        item.transformers = transformers.iter().map(|s| s.to_string()).collect();
        item
    }

    #[test]
    fn test_chain_runs_in_configured_order() {
        struct Append(&'static str);
        impl ItemTransformer for Append {
            fn before_propagation(
                &self,
                _item: ItemRef<'_>,
                _entity: &AnyEntity,
                schema_type: AttrSchemaType,
                values: Vec<AttrValue>,
            ) -> (AttrSchemaType, Vec<AttrValue>) {
                (
                    schema_type,
                    map_strings(values, |s| format!("{}{}", s, self.0)),
                )
            }
        }

        let mut registry = TransformerRegistry::default();
        registry.register("a", Arc::new(Append("a")));
        registry.register("b", Arc::new(Append("b")));

        let item = item_with(&["a", "b"]);
        let entity = AnyEntity::User(User::new("u1", "jdoe"));
        let (_, values) = registry.apply_propagation(
            ItemRef::from(&item),
            &entity,
            AttrSchemaType::String,
            vec!["x".into()],
        );
        assert_eq!(values, vec![AttrValue::String("xab".to_owned())]);
    }

    #[test]
    fn test_unknown_transformer_skipped() {
        let registry = TransformerRegistry::with_builtins();
        let item = item_with(&["nope", "uppercase"]);
        let entity = AnyEntity::User(User::new("u1", "jdoe"));
        let (_, values) = registry.apply_propagation(
            ItemRef::from(&item),
            &entity,
            AttrSchemaType::String,
            vec!["jdoe".into()],
        );
        assert_eq!(values, vec![AttrValue::String("JDOE".to_owned())]);
    }

    #[test]
    fn test_non_string_values_untouched() {
        let registry = TransformerRegistry::with_builtins();
        let item = item_with(&["uppercase"]);
        let values = registry.apply_pull(ItemRef::from(&item), vec![AttrValue::Long(5)]);
        assert_eq!(values, vec![AttrValue::Long(5)]);
    }
}
