//! Domain records returned by catalog queries.
//!
//! A [`Record`] is the engine-agnostic view of an indexed document: a schema
//! name plus multi-valued, typed attributes. Engine documents are converted
//! into records by the catalog client using the field resolver; records are
//! converted back into engine documents on the write path.
//!
//! # Examples
//!
//! ```
//! use halberd::record::{AttributeValue, Record};
//!
//! let record = Record::builder("base.record")
//!     .set_text("id", "a1b2c3")
//!     .set_text("title", "Arctic ice survey")
//!     .build();
//!
//! assert_eq!(record.id(), Some("a1b2c3"));
//! assert_eq!(
//!     record.first("title"),
//!     Some(&AttributeValue::Text("Arctic ice survey".to_string()))
//! );
//! ```

pub mod attributes;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a single value of a record attribute.
///
/// Attributes are multi-valued; a [`Record`] stores a list of these per
/// attribute name. Geometry values carry well-known text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String data for full-text search.
    Text(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating-point number.
    Float(f64),
    /// true/false value.
    Boolean(bool),
    /// UTC timestamp.
    Date(DateTime<Utc>),
    /// Geometry as well-known text.
    Geometry(String),
    /// Raw byte data.
    Binary(Vec<u8>),
    /// Opaque serialized object.
    Object(Vec<u8>),
}

impl AttributeValue {
    /// Get the value as text, if it is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as a date, if it is a date value.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Get the value as well-known text, if it is a geometry value.
    pub fn as_geometry(&self) -> Option<&str> {
        match self {
            AttributeValue::Geometry(wkt) => Some(wkt),
            _ => None,
        }
    }
}

/// A domain record: a schema name plus multi-valued typed attributes.
///
/// Attribute iteration order is the attribute name order, which keeps
/// conversions and comparisons deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    schema: String,
    attributes: BTreeMap<String, Vec<AttributeValue>>,
}

impl Record {
    /// Create a new empty record with the given schema name.
    pub fn new<S: Into<String>>(schema: S) -> Self {
        Record {
            schema: schema.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// The record's schema name.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Replace all values of an attribute.
    pub fn set_attribute<S: Into<String>>(&mut self, name: S, values: Vec<AttributeValue>) {
        self.attributes.insert(name.into(), values);
    }

    /// Append a single value to an attribute.
    pub fn add_value<S: Into<String>>(&mut self, name: S, value: AttributeValue) {
        self.attributes.entry(name.into()).or_default().push(value);
    }

    /// Get all values of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&[AttributeValue]> {
        self.attributes.get(name).map(|v| v.as_slice())
    }

    /// Get the first value of an attribute.
    pub fn first(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name).and_then(|v| v.first())
    }

    /// The record identifier, if set.
    pub fn id(&self) -> Option<&str> {
        self.first(attributes::ID).and_then(AttributeValue::as_text)
    }

    /// The record title, if set.
    pub fn title(&self) -> Option<&str> {
        self.first(attributes::TITLE).and_then(AttributeValue::as_text)
    }

    /// All attribute names in order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|s| s.as_str())
    }

    /// Iterate over all attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &[AttributeValue])> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Create a builder for constructing records.
    pub fn builder<S: Into<String>>(schema: S) -> RecordBuilder {
        RecordBuilder::new(schema)
    }
}

/// A builder for constructing records in a fluent manner.
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Create a new record builder for the given schema.
    pub fn new<S: Into<String>>(schema: S) -> Self {
        RecordBuilder {
            record: Record::new(schema),
        }
    }

    /// Add a text attribute value.
    pub fn set_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.record.add_value(name, AttributeValue::Text(value.into()));
        self
    }

    /// Add an integer attribute value.
    pub fn set_integer<S: Into<String>>(mut self, name: S, value: i64) -> Self {
        self.record.add_value(name, AttributeValue::Integer(value));
        self
    }

    /// Add a float attribute value.
    pub fn set_float<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.record.add_value(name, AttributeValue::Float(value));
        self
    }

    /// Add a boolean attribute value.
    pub fn set_boolean<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.record.add_value(name, AttributeValue::Boolean(value));
        self
    }

    /// Add a date attribute value.
    pub fn set_date<S: Into<String>>(mut self, name: S, value: DateTime<Utc>) -> Self {
        self.record.add_value(name, AttributeValue::Date(value));
        self
    }

    /// Add a geometry attribute value as well-known text.
    pub fn set_geometry<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.record
            .add_value(name, AttributeValue::Geometry(value.into()));
        self
    }

    /// Build the record.
    pub fn build(self) -> Record {
        self.record
    }
}

/// A content type exposed by the catalog: a name and an optional version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentType {
    /// Content type name.
    pub name: String,
    /// Content type version, when one is associated.
    pub version: Option<String>,
}

impl ContentType {
    /// Create a new content type.
    pub fn new<S: Into<String>>(name: S, version: Option<String>) -> Self {
        ContentType {
            name: name.into(),
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = Record::builder("base.record")
            .set_text(attributes::ID, "doc-1")
            .set_text(attributes::TITLE, "First")
            .set_integer("page-count", 12)
            .build();

        assert_eq!(record.schema(), "base.record");
        assert_eq!(record.id(), Some("doc-1"));
        assert_eq!(record.title(), Some("First"));
        assert_eq!(
            record.first("page-count").and_then(AttributeValue::as_integer),
            Some(12)
        );
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_multi_valued_attributes() {
        let mut record = Record::new("base.record");
        record.add_value("keyword", AttributeValue::Text("ice".to_string()));
        record.add_value("keyword", AttributeValue::Text("arctic".to_string()));

        let values = record.attribute("keyword").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].as_text(), Some("ice"));
        assert_eq!(values[1].as_text(), Some("arctic"));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(AttributeValue::Integer(3).as_float(), Some(3.0));
        assert_eq!(AttributeValue::Float(2.5).as_float(), Some(2.5));
        assert_eq!(AttributeValue::Text("x".to_string()).as_integer(), None);
        assert_eq!(
            AttributeValue::Geometry("POINT (10 20)".to_string()).as_geometry(),
            Some("POINT (10 20)")
        );
    }

    #[test]
    fn test_content_type_set_semantics() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(ContentType::new("imagery", Some("1.0".to_string())));
        set.insert(ContentType::new("imagery", Some("1.0".to_string())));
        set.insert(ContentType::new("imagery", None));

        assert_eq!(set.len(), 2);
    }
}
