//! Highlighting hooks around query execution.
//!
//! The catalog client calls [`Highlighter::pre_query`] before every standard
//! (non point-lookup) round-trip so the implementation can ask the engine
//! for highlight data, and [`Highlighter::post_query`] after execution when
//! the response carries highlight fragments. The hooks also run again for a
//! spellcheck requery, against the rewritten query.

use serde::{Deserialize, Serialize};

use crate::engine::{NativeQuery, NativeResponse};
use crate::operation::{HighlightEntry, QueryRequest, ResultEnvelope};

/// Highlight toggle parameter.
const HIGHLIGHT_PARAM: &str = "hl";

/// Fields to extract highlight fragments from.
const HIGHLIGHT_FIELDS_PARAM: &str = "hl.fl";

/// Pre- and post-query highlighting hooks.
pub trait Highlighter: Send + Sync + std::fmt::Debug {
    /// Mutate the native query before execution, typically to request
    /// highlight data.
    fn pre_query(&self, request: &QueryRequest, query: &mut NativeQuery);

    /// Merge highlight data from the response into the envelope.
    fn post_query(&self, response: &NativeResponse, envelope: &mut ResultEnvelope);
}

/// Field-level highlighter: requests fragments for every field and copies
/// them into the envelope untouched.
///
/// Construct it disabled to leave queries alone while still satisfying the
/// collaborator seam.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FieldHighlighter {
    enabled: bool,
}

impl FieldHighlighter {
    /// Create a highlighter.
    pub fn new(enabled: bool) -> Self {
        FieldHighlighter { enabled }
    }

    /// Whether this highlighter decorates queries.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Highlighter for FieldHighlighter {
    fn pre_query(&self, _request: &QueryRequest, query: &mut NativeQuery) {
        if !self.enabled {
            return;
        }
        query.set_param(HIGHLIGHT_PARAM, "true");
        query.set_param(HIGHLIGHT_FIELDS_PARAM, "*");
    }

    fn post_query(&self, response: &NativeResponse, envelope: &mut ResultEnvelope) {
        for (document_id, fields) in &response.highlighting {
            for (field, fragments) in fields {
                envelope.highlights.push(HighlightEntry {
                    document_id: document_id.clone(),
                    field: field.clone(),
                    fragments: fragments.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_query_only_when_enabled() {
        let request = QueryRequest::empty();

        let mut query = NativeQuery::new("*:*");
        FieldHighlighter::new(false).pre_query(&request, &mut query);
        assert!(!query.has_param(HIGHLIGHT_PARAM));

        FieldHighlighter::new(true).pre_query(&request, &mut query);
        assert_eq!(query.param(HIGHLIGHT_PARAM), Some("true"));
        assert_eq!(query.param(HIGHLIGHT_FIELDS_PARAM), Some("*"));
    }

    #[test]
    fn test_post_query_copies_fragments() {
        let mut response = NativeResponse::default();
        response
            .highlighting
            .entry("doc-1".to_string())
            .or_default()
            .insert(
                "title_txt".to_string(),
                vec!["<em>ice</em> survey".to_string()],
            );

        let mut envelope = ResultEnvelope::empty();
        FieldHighlighter::new(true).post_query(&response, &mut envelope);

        assert_eq!(envelope.highlights.len(), 1);
        let entry = &envelope.highlights[0];
        assert_eq!(entry.document_id, "doc-1");
        assert_eq!(entry.field, "title_txt");
        assert_eq!(entry.fragments, vec!["<em>ice</em> survey".to_string()]);
    }
}
