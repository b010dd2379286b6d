//! The uniform result envelope assembled from engine responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::operation::SortOrder;
use crate::record::Record;

/// Metric keys for per-phase query timings.
///
/// Every key is `metrics.query.<phase>.elapsed` with a nanosecond value;
/// phases that did not run for a given request are absent.
pub mod metrics {
    /// Namespace prefix of every query metric key.
    pub const PREFIX: &str = "metrics.query.";

    /// Suffix of every query metric key.
    pub const SUFFIX: &str = ".elapsed";

    /// Filter adaptation and query shaping.
    pub const BUILD: &str = "build";
    /// Facet request building.
    pub const FACET_REQUEST: &str = "facet-request";
    /// Suggestion request building.
    pub const SUGGESTION_REQUEST: &str = "suggestion-request";
    /// Highlighter pre-query hook.
    pub const HIGHLIGHT_PRE: &str = "highlight-pre";
    /// Standard query round-trip.
    pub const EXECUTE: &str = "execute";
    /// Real-time point-lookup round-trip.
    pub const REALTIME_EXECUTE: &str = "realtime-execute";
    /// Facet response conversion.
    pub const FACET_RESPONSE: &str = "facet-response";
    /// Suggestion response flattening.
    pub const SUGGESTION_RESPONSE: &str = "suggestion-response";
    /// Partial-results header handling.
    pub const PARTIAL_RESULTS: &str = "partial-results";
    /// Spellcheck evaluation including any requery.
    pub const SPELLCHECK: &str = "spellcheck";
    /// Highlighter post-query hook.
    pub const HIGHLIGHT: &str = "highlight";
    /// Whole query, end to end.
    pub const TOTAL: &str = "total";

    /// Build the metric key for a phase.
    pub fn key(phase: &str) -> String {
        format!("{PREFIX}{phase}{SUFFIX}")
    }
}

/// What became of one requested sort criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SortApplication {
    /// The criterion was translated into a native sort clause on `field`.
    Applied {
        /// Native sort key the clause was added on.
        field: String,
        /// Requested direction.
        order: SortOrder,
    },
    /// The criterion could not be translated and was left off the query.
    Skipped {
        /// The requested sort property.
        property: String,
        /// Why no clause was added.
        reason: String,
    },
}

/// Facet counts for one abstract attribute, in engine bucket order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetAttributeResult {
    /// Abstract attribute the counts belong to.
    pub attribute: String,
    /// Bucket values.
    pub values: Vec<String>,
    /// Document counts, parallel to `values`.
    pub counts: Vec<i64>,
}

impl FacetAttributeResult {
    /// Create a facet result for an attribute.
    pub fn new<S: Into<String>>(attribute: S, values: Vec<String>, counts: Vec<i64>) -> Self {
        FacetAttributeResult {
            attribute: attribute.into(),
            values,
            counts,
        }
    }
}

/// One suggester hit: the stored payload and the suggested term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionHit {
    /// Opaque payload stored with the term.
    pub payload: String,
    /// Suggested term.
    pub term: String,
}

/// Highlight fragments for one field of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightEntry {
    /// Identifier of the highlighted document.
    pub document_id: String,
    /// Native field the fragments were extracted from.
    pub field: String,
    /// Highlighted fragments with match markers.
    pub fragments: Vec<String>,
}

/// A single search hit: the record plus optional ranking data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The converted record.
    pub record: Record,
    /// Relevance score when the query sorted by relevance.
    pub relevance: Option<f64>,
    /// Distance from the query point in meters when the query sorted by
    /// distance.
    pub distance_meters: Option<f64>,
}

impl QueryResult {
    /// Create a result with no ranking data.
    pub fn new(record: Record) -> Self {
        QueryResult {
            record,
            relevance: None,
            distance_meters: None,
        }
    }
}

/// The uniform answer to a catalog query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Search hits in engine order.
    pub results: Vec<QueryResult>,
    /// Total matches across all pages.
    pub total_hits: i64,
    /// Facet results, present only for faceted requests.
    pub facets: Vec<FacetAttributeResult>,
    /// Suggester hits, present when the engine returned suggester output.
    pub suggestions: Vec<SuggestionHit>,
    /// Original (misspelled) terms when a spellcheck requery was adopted.
    pub did_you_mean: Vec<String>,
    /// Corrected terms when a spellcheck requery was adopted.
    pub showing_results_for: Vec<String>,
    /// Whether the engine truncated the search because of a time allowance.
    pub partial: bool,
    /// Highlight fragments merged by the highlighter.
    pub highlights: Vec<HighlightEntry>,
    /// The fate of each requested sort criterion, in request order.
    pub sort_applications: Vec<SortApplication>,
    /// Per-phase elapsed timings in nanoseconds, keyed by
    /// [`metrics::key`].
    pub metrics: BTreeMap<String, u64>,
}

impl ResultEnvelope {
    /// An empty, complete envelope with zero hits.
    pub fn empty() -> Self {
        ResultEnvelope::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_key_shape() {
        assert_eq!(
            metrics::key(metrics::EXECUTE),
            "metrics.query.execute.elapsed"
        );
        assert_eq!(metrics::key(metrics::TOTAL), "metrics.query.total.elapsed");
    }

    #[test]
    fn test_empty_envelope_is_complete() {
        let envelope = ResultEnvelope::empty();
        assert!(envelope.results.is_empty());
        assert_eq!(envelope.total_hits, 0);
        assert!(!envelope.partial);
        assert!(envelope.sort_applications.is_empty());
        assert!(envelope.metrics.is_empty());
    }
}
