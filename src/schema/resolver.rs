//! Suffix-based field resolver.
//!
//! Maps abstract attribute names onto suffix-typed dynamic fields and back,
//! keeping a registry of fields it has seen so that anonymous lookups
//! (`title` → `title_txt`) answer from observed schema rather than guesses.
//! The registry grows on the write path: populating a document registers
//! every field it writes.

use std::collections::BTreeSet;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::engine::NativeDocument;
use crate::error::{Error, Result};
use crate::record::{AttributeValue, Record};
use crate::schema::field::{FieldKind, SORT_SUFFIX, base_name, field_name};
use crate::schema::FieldResolver;

/// Field carrying the record's schema name. Leading underscore keeps it out
/// of converted records.
pub const SCHEMA_FIELD: &str = "_schema_txt";

/// Pseudo-field carrying the engine's relevance score.
pub const SCORE_FIELD: &str = "score";

/// Resolver for suffix-addressed dynamic schemas.
#[derive(Debug, Default)]
pub struct SuffixFieldResolver {
    known_fields: RwLock<AHashMap<String, BTreeSet<String>>>,
}

impl SuffixFieldResolver {
    /// Create a resolver with an empty field registry.
    pub fn new() -> Self {
        SuffixFieldResolver::default()
    }

    /// Create a resolver pre-seeded with known native field names.
    pub fn with_known_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resolver = SuffixFieldResolver::new();
        for field in fields {
            resolver.register_field(field.into());
        }
        resolver
    }

    /// Record a native field name in the registry.
    pub fn register_field<S: Into<String>>(&self, field: S) {
        let field = field.into();
        let attribute = base_name(&field).to_string();
        self.known_fields
            .write()
            .entry(attribute)
            .or_default()
            .insert(field);
    }

    fn known_field_for(&self, attribute: &str, kind: Option<FieldKind>) -> Option<String> {
        let registry = self.known_fields.read();
        let fields = registry.get(attribute)?;
        match kind {
            Some(kind) => fields
                .iter()
                .find(|field| FieldKind::of_field(field) == Some(kind))
                .cloned(),
            None => fields.iter().next().cloned(),
        }
    }

    fn value_kind(value: &AttributeValue) -> FieldKind {
        match value {
            AttributeValue::Text(_) => FieldKind::Text,
            AttributeValue::Integer(_) => FieldKind::Integer,
            AttributeValue::Float(_) => FieldKind::Float,
            AttributeValue::Boolean(_) => FieldKind::Boolean,
            AttributeValue::Date(_) => FieldKind::Date,
            AttributeValue::Geometry(_) => FieldKind::Geometry,
            AttributeValue::Binary(_) => FieldKind::Binary,
            AttributeValue::Object(_) => FieldKind::Object,
        }
    }
}

impl FieldResolver for SuffixFieldResolver {
    fn resolve_field(&self, attribute: &str, kind: Option<FieldKind>, exact: bool) -> Option<String> {
        if let Some(field) = self.known_field_for(attribute, kind) {
            return Some(field);
        }
        if exact {
            return None;
        }
        Some(field_name(attribute, kind.unwrap_or(FieldKind::Text)))
    }

    fn resolve_attribute(&self, field: &str) -> String {
        base_name(field).to_string()
    }

    fn record_schema(&self, document: &NativeDocument) -> Result<String> {
        document
            .first(SCHEMA_FIELD)
            .and_then(AttributeValue::as_text)
            .map(|schema| schema.to_string())
            .ok_or_else(|| Error::record_creation("document carries no schema field"))
    }

    fn anonymous_fields(&self, attribute: &str) -> Vec<String> {
        self.known_fields
            .read()
            .get(attribute)
            .map(|fields| fields.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn is_private(&self, field: &str) -> bool {
        field.starts_with('_') || field == SCORE_FIELD || field.ends_with(SORT_SUFFIX)
    }

    fn sort_key(&self, field: &str) -> String {
        if FieldKind::of_field(field) == Some(FieldKind::Text) && !field.ends_with(SORT_SUFFIX) {
            format!("{field}{SORT_SUFFIX}")
        } else {
            field.to_string()
        }
    }

    fn populate_document(&self, record: &Record, document: &mut NativeDocument) -> Result<()> {
        document.set_values(
            SCHEMA_FIELD,
            vec![AttributeValue::Text(record.schema().to_string())],
        );
        for (attribute, values) in record.attributes() {
            let Some(first) = values.first() else {
                continue;
            };
            let kind = Self::value_kind(first);
            if values.iter().any(|value| Self::value_kind(value) != kind) {
                return Err(Error::record_creation(format!(
                    "attribute '{attribute}' mixes value types"
                )));
            }
            let field = field_name(attribute, kind);
            document.set_values(field.clone(), values.to_vec());
            self.register_field(field);
        }
        Ok(())
    }
}
