//! Engine-native response representation.
//!
//! Engines hand back a [`NativeResponse`]: matched documents plus the
//! optional sections the client may have asked for (facet counts, pivot
//! trees, suggester buckets, spellcheck collations, highlighting) and a
//! response header. The response assembler turns this into the uniform
//! result envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::AttributeValue;

/// A document as returned by (or sent to) the engine: multi-valued typed
/// fields keyed by native field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeDocument {
    fields: BTreeMap<String, Vec<AttributeValue>>,
}

impl NativeDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        NativeDocument::default()
    }

    /// Append a value to a field.
    pub fn add_value<S: Into<String>>(&mut self, field: S, value: AttributeValue) {
        self.fields.entry(field.into()).or_default().push(value);
    }

    /// Replace all values of a field.
    pub fn set_values<S: Into<String>>(&mut self, field: S, values: Vec<AttributeValue>) {
        self.fields.insert(field.into(), values);
    }

    /// All values of a field.
    pub fn values(&self, field: &str) -> Option<&[AttributeValue]> {
        self.fields.get(field).map(|v| v.as_slice())
    }

    /// The first value of a field.
    pub fn first(&self, field: &str) -> Option<&AttributeValue> {
        self.fields.get(field).and_then(|v| v.first())
    }

    /// Check whether a field is present.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// All field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }

    /// Iterate over all fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[AttributeValue])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Per-field facet counts: bucket values and their document counts, in the
/// order the engine returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetFieldCounts {
    /// Native field name the counts belong to.
    pub field: String,
    /// (bucket value, document count) pairs in engine order.
    pub counts: Vec<(String, i64)>,
}

impl FacetFieldCounts {
    /// Create facet counts for a field.
    pub fn new<S: Into<String>>(field: S, counts: Vec<(String, i64)>) -> Self {
        FacetFieldCounts {
            field: field.into(),
            counts,
        }
    }
}

/// One node of a pivot facet tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotBucket {
    /// Bucket value.
    pub value: String,
    /// Document count for this bucket.
    pub count: i64,
    /// Nested buckets of the next pivot level.
    pub children: Vec<PivotBucket>,
}

impl PivotBucket {
    /// Create a leaf pivot bucket.
    pub fn new<S: Into<String>>(value: S, count: i64) -> Self {
        PivotBucket {
            value: value.into(),
            count,
            children: Vec::new(),
        }
    }

    /// Create a pivot bucket with children.
    pub fn with_children<S: Into<String>>(value: S, count: i64, children: Vec<PivotBucket>) -> Self {
        PivotBucket {
            value: value.into(),
            count,
            children,
        }
    }
}

/// A pivot facet result: the requested pivot specification and its buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetPivot {
    /// The comma-joined field specification this pivot was computed for.
    pub spec: String,
    /// Top-level buckets.
    pub buckets: Vec<PivotBucket>,
}

/// A single suggester hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Suggested term.
    pub term: String,
    /// Suggester weight.
    pub weight: i64,
    /// Opaque payload stored with the term.
    pub payload: String,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new<T: Into<String>, P: Into<String>>(term: T, weight: i64, payload: P) -> Self {
        Suggestion {
            term: term.into(),
            weight,
            payload: payload.into(),
        }
    }
}

/// A spelling-correction candidate: an alternate query string, an estimated
/// hit count, and the term corrections that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collation {
    /// The corrected query string.
    pub query: String,
    /// Estimated hits for the corrected query.
    pub hits: i64,
    /// (original, corrected) term pairs.
    pub corrections: Vec<(String, String)>,
}

impl Collation {
    /// Create a new collation.
    pub fn new<S: Into<String>>(query: S, hits: i64, corrections: Vec<(String, String)>) -> Self {
        Collation {
            query: query.into(),
            hits,
            corrections,
        }
    }
}

/// Response header: execution metadata the engine reports alongside results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// Whether the engine truncated the search because of a time allowance.
    pub partial_results: bool,
    /// Engine-side query time in milliseconds.
    pub q_time_ms: i64,
    /// Echo of the request parameters, single-valued.
    pub params: BTreeMap<String, String>,
}

/// Everything an engine returns for one query round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeResponse {
    /// Matched documents for the requested page.
    pub documents: Vec<NativeDocument>,
    /// Total matches across all pages.
    pub num_found: i64,
    /// Facet counts per faceted field, in request order.
    pub facet_fields: Vec<FacetFieldCounts>,
    /// Pivot facet trees, in request order.
    pub facet_pivots: Vec<FacetPivot>,
    /// Suggester output keyed by dictionary name.
    pub suggestions: BTreeMap<String, Vec<Suggestion>>,
    /// Spellcheck collations in engine order.
    pub collations: Vec<Collation>,
    /// Highlight fragments: document id → field → fragments.
    pub highlighting: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Execution metadata.
    pub header: ResponseHeader,
}

impl NativeResponse {
    /// Create a response carrying only documents.
    pub fn with_documents(documents: Vec<NativeDocument>) -> Self {
        let num_found = documents.len() as i64;
        NativeResponse {
            documents,
            num_found,
            ..NativeResponse::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_fields_ordered() {
        let mut doc = NativeDocument::new();
        doc.add_value("title_txt", AttributeValue::Text("b".to_string()));
        doc.add_value("id_txt", AttributeValue::Text("a".to_string()));

        let names: Vec<&str> = doc.field_names().collect();
        assert_eq!(names, ["id_txt", "title_txt"]);
    }

    #[test]
    fn test_with_documents_sets_num_found() {
        let response = NativeResponse::with_documents(vec![
            NativeDocument::new(),
            NativeDocument::new(),
        ]);
        assert_eq!(response.num_found, 2);
        assert!(!response.header.partial_results);
    }
}
