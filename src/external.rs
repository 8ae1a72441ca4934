//! Connector-facing attribute representation.
//!
//! The push assembler produces an [`AttributeSet`]: a map keyed by external
//! attribute name whose merge operation unions value sets instead of
//! overwriting, so two mapping items targeting the same external name
//! accumulate. Operational attributes (object name, password, enable flag)
//! use the reserved names connectors understand; password values are
//! redacted from `Debug` output.

use std::collections::HashMap;
use std::fmt;

use crate::model::AttrValue;

/// Reserved operational attribute names.
pub mod names {
    /// External object name (distinct from the connector key).
    pub const NAME: &str = "__NAME__";
    /// Account password.
    pub const PASSWORD: &str = "__PASSWORD__";
    /// Enabled/disabled status flag.
    pub const ENABLE: &str = "__ENABLE__";
}

/// One external attribute: name plus a set of opaque values.
///
/// An empty value list means "attribute present but empty", which connectors
/// treat differently from an absent attribute.
#[derive(Clone, PartialEq)]
pub struct ExternalAttr {
    pub name: String,
    pub values: Vec<AttrValue>,
}

impl ExternalAttr {
    pub fn new(name: impl Into<String>, values: Vec<AttrValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Attribute present but carrying no values.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn single(name: impl Into<String>, value: AttrValue) -> Self {
        Self::new(name, vec![value])
    }

    /// The `__NAME__` operational attribute.
    pub fn object_name(value: impl Into<String>) -> Self {
        Self::single(names::NAME, AttrValue::String(value.into()))
    }

    /// The `__PASSWORD__` operational attribute.
    pub fn password(plaintext: impl Into<String>) -> Self {
        Self::single(names::PASSWORD, AttrValue::String(plaintext.into()))
    }

    /// The `__ENABLE__` operational attribute.
    pub fn enabled(enable: bool) -> Self {
        Self::single(names::ENABLE, AttrValue::Boolean(enable))
    }

    pub fn is_password(&self) -> bool {
        self.name == names::PASSWORD
    }

    /// First value in string form, if any.
    pub fn first_string(&self) -> Option<String> {
        self.values.first().map(AttrValue::as_string)
    }
}

impl fmt::Debug for ExternalAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("ExternalAttr");
        debug.field("name", &self.name);
        if self.is_password() {
            debug.field("values", &"<redacted>");
        } else {
            debug.field("values", &self.values);
        }
        debug.finish()
    }
}

/// The attribute set handed to the connector layer, keyed by external name.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    attrs: HashMap<String, ExternalAttr>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an attribute in: union with the existing value set under the
    /// same name, insert fresh otherwise. Duplicate values are dropped.
    pub fn merge(&mut self, attr: ExternalAttr) {
        match self.attrs.get_mut(&attr.name) {
            Some(existing) => {
                for value in attr.values {
                    if !existing.values.contains(&value) {
                        existing.values.push(value);
                    }
                }
            }
            None => {
                self.attrs.insert(attr.name.clone(), attr);
            }
        }
    }

    /// Insert an attribute, replacing any existing one under the same name.
    pub fn replace(&mut self, attr: ExternalAttr) {
        self.attrs.insert(attr.name.clone(), attr);
    }

    pub fn remove(&mut self, name: &str) -> Option<ExternalAttr> {
        self.attrs.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ExternalAttr> {
        self.attrs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExternalAttr> {
        self.attrs.values()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl IntoIterator for AttributeSet {
    type Item = ExternalAttr;
    type IntoIter = std::collections::hash_map::IntoValues<String, ExternalAttr>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.into_values()
    }
}

impl PartialEq for AttributeSet {
    /// Set equality: same names, same values regardless of order.
    fn eq(&self, other: &Self) -> bool {
        self.attrs.len() == other.attrs.len()
            && self.attrs.iter().all(|(name, attr)| {
                other
                    .attrs
                    .get(name)
                    .is_some_and(|o| values_unordered_eq(&attr.values, &o.values))
            })
    }
}

fn values_unordered_eq(left: &[AttrValue], right: &[AttrValue]) -> bool {
    left.len() == right.len()
        && left.iter().all(|v| right.contains(v))
        && right.iter().all(|v| left.contains(v))
}
