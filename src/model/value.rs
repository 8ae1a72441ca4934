//! Typed internal attribute values and coercion rules.
//!
//! Every value the resolver extracts from the identity graph is normalized
//! into an [`AttrValue`] tagged with one of the schema types in
//! [`AttrSchemaType`]. Connectors do not understand temporal types, so dates
//! are always rendered as ISO-8601 extended strings before leaving the
//! engine; booleans, longs and doubles travel in their native representation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema types an internal attribute value can carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttrSchemaType {
    /// String value
    String,
    /// 64-bit integer value
    Long,
    /// Floating point value
    Double,
    /// Boolean value
    Boolean,
    /// Instant in time, rendered ISO-8601 on the wire
    Date,
    /// Raw bytes, rendered base64 in string form
    Binary,
}

impl Default for AttrSchemaType {
    fn default() -> Self {
        Self::String
    }
}

impl fmt::Display for AttrSchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Binary => "Binary",
        };
        write!(f, "{}", name)
    }
}

impl AttrSchemaType {
    /// Whether the connector layer accepts this type natively.
    ///
    /// Dates are the one supported internal type connectors cannot carry,
    /// so they are rewritten to their string rendition during assembly.
    pub fn is_conn_native(self) -> bool {
        !matches!(self, Self::Date)
    }
}

/// A single resolved attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Binary(Vec<u8>),
}

impl AttrValue {
    /// The schema type this value naturally carries.
    pub fn schema_type(&self) -> AttrSchemaType {
        match self {
            Self::String(_) => AttrSchemaType::String,
            Self::Long(_) => AttrSchemaType::Long,
            Self::Double(_) => AttrSchemaType::Double,
            Self::Boolean(_) => AttrSchemaType::Boolean,
            Self::Date(_) => AttrSchemaType::Date,
            Self::Binary(_) => AttrSchemaType::Binary,
        }
    }

    /// Canonical string rendition of this value.
    ///
    /// Dates are formatted as ISO-8601 extended with offset; binary data is
    /// base64-encoded.
    pub fn as_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Long(l) => l.to_string(),
            Self::Double(d) => d.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::Binary(b) => BASE64.encode(b),
        }
    }

    /// Convert into the representation handed to the connector layer.
    ///
    /// Values of connector-native types pass through unchanged; anything else
    /// (currently only dates) is replaced by its string rendition.
    pub fn into_conn_value(self) -> AttrValue {
        if self.schema_type().is_conn_native() {
            self
        } else {
            AttrValue::String(self.as_string())
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

/// Lenient boolean parsing for pulled values.
///
/// Connectors report enabled/flag attributes with a variety of spellings.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}
