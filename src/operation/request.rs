//! Query requests: the abstract, engine-agnostic input to the catalog client.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::filter::Filter;

/// Sort property selecting the engine's relevance score.
pub const RELEVANCE: &str = "relevance";

/// Sort property selecting geodesic distance from the filter's point.
pub const DISTANCE: &str = "distance";

/// Sort property selecting the record's effective date.
pub const TEMPORAL: &str = "temporal";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A sort criterion: an attribute (or special property) and a direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortCriterion {
    /// Attribute name, or one of [`RELEVANCE`], [`DISTANCE`], [`TEMPORAL`].
    pub attribute: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl SortCriterion {
    /// Create a sort criterion.
    pub fn new<S: Into<String>>(attribute: S, order: SortOrder) -> Self {
        SortCriterion {
            attribute: attribute.into(),
            order,
        }
    }

    /// Ascending sort on an attribute.
    pub fn ascending<S: Into<String>>(attribute: S) -> Self {
        SortCriterion::new(attribute, SortOrder::Ascending)
    }

    /// Descending sort on an attribute.
    pub fn descending<S: Into<String>>(attribute: S) -> Self {
        SortCriterion::new(attribute, SortOrder::Descending)
    }
}

/// Facet bucket ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacetSort {
    /// Highest count first.
    Count,
    /// Lexicographic by value.
    Index,
}

impl FacetSort {
    /// The engine parameter value for this ordering.
    pub fn as_param(self) -> &'static str {
        match self {
            FacetSort::Count => "count",
            FacetSort::Index => "index",
        }
    }
}

/// Request for facet counts on a set of attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSpec {
    /// Attributes to facet on.
    pub attributes: Vec<String>,
    /// Bucket ordering.
    pub sort: FacetSort,
    /// Maximum buckets per attribute.
    pub limit: i64,
    /// Minimum document count for a bucket to be returned.
    pub min_count: i64,
}

impl FacetSpec {
    /// Facet on the given attributes with default ordering and limits.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FacetSpec {
            attributes: attributes.into_iter().map(Into::into).collect(),
            ..FacetSpec::default()
        }
    }

    /// Set the bucket ordering.
    pub fn sort(mut self, sort: FacetSort) -> Self {
        self.sort = sort;
        self
    }

    /// Set the maximum buckets per attribute.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set the minimum bucket count.
    pub fn min_count(mut self, min_count: i64) -> Self {
        self.min_count = min_count;
        self
    }
}

impl Default for FacetSpec {
    fn default() -> Self {
        FacetSpec {
            attributes: Vec::new(),
            sort: FacetSort::Count,
            limit: 100,
            min_count: 1,
        }
    }
}

/// Request for suggester output instead of a document search.
///
/// All three identifying fields are mandatory; a request carrying this spec
/// abandons the document query entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSpec {
    /// Free-text input to complete.
    pub query: String,
    /// Context filter restricting the suggestion space.
    pub context: String,
    /// Suggester dictionary to consult.
    pub dictionary: String,
    /// Ask the engine to rebuild the suggester index first.
    pub rebuild: Option<bool>,
}

impl SuggestionSpec {
    /// Create a suggestion request.
    pub fn new<Q, C, D>(query: Q, context: C, dictionary: D) -> Self
    where
        Q: Into<String>,
        C: Into<String>,
        D: Into<String>,
    {
        SuggestionSpec {
            query: query.into(),
            context: context.into(),
            dictionary: dictionary.into(),
            rebuild: None,
        }
    }

    /// Set the rebuild-index flag.
    pub fn rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = Some(rebuild);
        self
    }
}

/// Real-time point-lookup hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RealtimeGet {
    /// Use a point lookup when the filter is recognized as an identifier
    /// equality.
    #[default]
    Auto,
    /// Force the point-lookup path regardless of the filter shape.
    Always,
    /// Never use the point-lookup path.
    Never,
}

/// Typed optional features of a query request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Facet counts to compute alongside the search.
    pub facet: Option<FacetSpec>,
    /// Suggester request replacing the document search.
    pub suggestion: Option<SuggestionSpec>,
    /// Ask the engine for spelling collations and requery on a better one.
    pub spellcheck: bool,
    /// Real-time point-lookup hint.
    pub realtime: RealtimeGet,
}

impl QueryOptions {
    /// Check internal consistency.
    ///
    /// A suggestion request replaces the native query wholesale, so
    /// combining it with a facet request can never be served; the
    /// combination is rejected here rather than silently dropping the
    /// facets.
    pub fn validate(&self) -> Result<()> {
        if self.facet.is_some() && self.suggestion.is_some() {
            return Err(Error::invalid_query(
                "Facet and suggestion requests are mutually exclusive",
            ));
        }
        Ok(())
    }
}

/// The search part of a request: filter, sorts, and paging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Abstract filter expression.
    pub filter: Filter,
    /// Primary sort criterion.
    pub sort: Option<SortCriterion>,
    /// Additional sort criteria, applied after the primary in order.
    pub additional_sorts: Vec<SortCriterion>,
    /// 1-based index of the first result to return.
    pub start_index: i64,
    /// Requested page size. Zero returns metadata only; a negative value
    /// requests the entire result set.
    pub page_size: i64,
}

impl CatalogQuery {
    /// Create a query for a filter with default paging (first page of 10).
    pub fn new(filter: Filter) -> Self {
        CatalogQuery {
            filter,
            sort: None,
            additional_sorts: Vec::new(),
            start_index: 1,
            page_size: 10,
        }
    }

    /// Set the primary sort criterion.
    pub fn sort(mut self, sort: SortCriterion) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Append an additional sort criterion.
    pub fn additional_sort(mut self, sort: SortCriterion) -> Self {
        self.additional_sorts.push(sort);
        self
    }

    /// Set the 1-based start index.
    pub fn start_index(mut self, start_index: i64) -> Self {
        self.start_index = start_index;
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Request the entire result set instead of a page.
    pub fn fetch_all(mut self) -> Self {
        self.page_size = -1;
        self
    }
}

/// A complete query request.
///
/// The client treats it as immutable; everything derived from it flows out
/// through the result envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The search to run. A request without a query yields an empty
    /// envelope without touching the engine.
    pub query: Option<CatalogQuery>,
    /// Optional typed features.
    pub options: QueryOptions,
    /// Caller-supplied trace identifier carried through logging.
    pub trace_id: Option<Uuid>,
}

impl QueryRequest {
    /// Create a request for a catalog query.
    pub fn new(query: CatalogQuery) -> Self {
        QueryRequest {
            query: Some(query),
            ..QueryRequest::default()
        }
    }

    /// Create a request with no query.
    pub fn empty() -> Self {
        QueryRequest::default()
    }

    /// Attach a facet spec.
    pub fn facet(mut self, facet: FacetSpec) -> Self {
        self.options.facet = Some(facet);
        self
    }

    /// Attach a suggestion spec.
    pub fn suggestion(mut self, suggestion: SuggestionSpec) -> Self {
        self.options.suggestion = Some(suggestion);
        self
    }

    /// Toggle spellcheck requerying.
    pub fn spellcheck(mut self, spellcheck: bool) -> Self {
        self.options.spellcheck = spellcheck;
        self
    }

    /// Set the real-time point-lookup hint.
    pub fn realtime(mut self, realtime: RealtimeGet) -> Self {
        self.options.realtime = realtime;
        self
    }

    /// Attach a trace identifier.
    pub fn trace_id(mut self, trace_id: Uuid) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::attributes;

    #[test]
    fn test_options_validation() {
        let valid = QueryOptions {
            facet: Some(FacetSpec::new(["content-type"])),
            ..QueryOptions::default()
        };
        assert!(valid.validate().is_ok());

        let conflicting = QueryOptions {
            facet: Some(FacetSpec::new(["content-type"])),
            suggestion: Some(SuggestionSpec::new("arct", "*:*", "catalog")),
            ..QueryOptions::default()
        };
        assert!(matches!(
            conflicting.validate(),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_request_builder() {
        let request = QueryRequest::new(
            CatalogQuery::new(Filter::equals(attributes::TITLE, "ice"))
                .sort(SortCriterion::descending(RELEVANCE))
                .start_index(11)
                .page_size(20),
        )
        .spellcheck(true);

        let query = request.query.as_ref().unwrap();
        assert_eq!(query.start_index, 11);
        assert_eq!(query.page_size, 20);
        assert!(request.options.spellcheck);
        assert_eq!(request.options.realtime, RealtimeGet::Auto);
    }

    #[test]
    fn test_facet_spec_defaults() {
        let spec = FacetSpec::new(["content-type", "keyword"]);
        assert_eq!(spec.sort, FacetSort::Count);
        assert_eq!(spec.limit, 100);
        assert_eq!(spec.min_count, 1);
        assert_eq!(spec.attributes.len(), 2);
    }

    #[test]
    fn test_options_serde_shape() {
        let options = QueryOptions {
            suggestion: Some(SuggestionSpec::new("arct", "*:*", "catalog").rebuild(true)),
            spellcheck: true,
            ..QueryOptions::default()
        };

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["spellcheck"], serde_json::json!(true));
        assert_eq!(json["suggestion"]["dictionary"], serde_json::json!("catalog"));
        assert_eq!(json["facet"], serde_json::Value::Null);
    }

    #[test]
    fn test_request_serde_round_trip_keeps_trace_id() {
        let request = QueryRequest::new(
            CatalogQuery::new(Filter::equals(attributes::TITLE, "ice")).page_size(25),
        )
        .spellcheck(true)
        .trace_id(Uuid::new_v4());

        let json = serde_json::to_string(&request).unwrap();
        let restored: QueryRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, request);
        assert_eq!(restored.trace_id, request.trace_id);
    }
}
