//! Engine-native query representation.
//!
//! A [`NativeQuery`] is an ordered, multi-valued parameter map in the
//! engine's own vocabulary. The catalog client owns it exclusively while
//! shaping: the filter adapter writes the main query clause, the shaper adds
//! paging/sort/time parameters, and the facet and suggestion builders add
//! theirs. Engines receive it by reference and serialize it onto the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::operation::SortOrder;

/// Well-known parameter names understood by the engine family this client
/// targets.
pub mod params {
    /// Main query clause.
    pub const QUERY: &str = "q";
    /// Filter query clause, cached independently of relevance.
    pub const FILTER_QUERY: &str = "fq";
    /// Zero-based result offset.
    pub const START: &str = "start";
    /// Maximum number of returned documents.
    pub const ROWS: &str = "rows";
    /// Sort clauses, comma-joined on the wire.
    pub const SORT: &str = "sort";
    /// Returned field list.
    pub const FIELD_LIST: &str = "fl";
    /// Request handler selector.
    pub const HANDLER: &str = "qt";
    /// Soft execution deadline in milliseconds.
    pub const TIME_ALLOWED: &str = "timeAllowed";
    /// Identifier list for point lookups.
    pub const IDS: &str = "ids";
    /// Spellcheck toggle.
    pub const SPELLCHECK: &str = "spellcheck";
    /// Facet engine toggle.
    pub const FACET: &str = "facet";
    /// Field to facet on.
    pub const FACET_FIELD: &str = "facet.field";
    /// Facet bucket ordering (`count` or `index`).
    pub const FACET_SORT: &str = "facet.sort";
    /// Maximum facet buckets per field.
    pub const FACET_LIMIT: &str = "facet.limit";
    /// Minimum count for a facet bucket to be returned.
    pub const FACET_MIN_COUNT: &str = "facet.mincount";
    /// Pivot facet specification.
    pub const FACET_PIVOT: &str = "facet.pivot";
    /// Suggestion query string.
    pub const SUGGEST_QUERY: &str = "suggest.q";
    /// Suggestion context filter query.
    pub const SUGGEST_CONTEXT: &str = "suggest.cfq";
    /// Suggestion dictionary name.
    pub const SUGGEST_DICTIONARY: &str = "suggest.dictionary";
    /// Rebuild the suggester index before answering.
    pub const SUGGEST_BUILD: &str = "suggest.build";
    /// Spatial field used by distance sorting.
    pub const SORT_FIELD: &str = "sfield";
    /// Spatial point used by distance sorting, as `lat,lon`.
    pub const POINT: &str = "pt";
}

/// Request handler for real-time point lookups.
pub const GET_HANDLER: &str = "/get";

/// Request handler for suggestion-only queries.
pub const SUGGEST_HANDLER: &str = "/suggest";

/// Mutable builder for an engine-native query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeQuery {
    params: BTreeMap<String, Vec<String>>,
}

impl NativeQuery {
    /// Create a query with the given main query clause.
    pub fn new<S: Into<String>>(query: S) -> Self {
        let mut native = NativeQuery::default();
        native.set_query(query);
        native
    }

    /// Set the main query clause.
    pub fn set_query<S: Into<String>>(&mut self, query: S) {
        self.set_param(params::QUERY, query);
    }

    /// The main query clause, if set.
    pub fn query(&self) -> Option<&str> {
        self.param(params::QUERY)
    }

    /// Replace a parameter with a single value.
    pub fn set_param<S: Into<String>>(&mut self, name: &str, value: S) {
        self.params.insert(name.to_string(), vec![value.into()]);
    }

    /// Replace a parameter with a list of values.
    pub fn set_param_values(&mut self, name: &str, values: Vec<String>) {
        self.params.insert(name.to_string(), values);
    }

    /// Append a value to a parameter.
    pub fn add_param<S: Into<String>>(&mut self, name: &str, value: S) {
        self.params
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    /// The first value of a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(|values| values.first())
            .map(|s| s.as_str())
    }

    /// All values of a parameter.
    pub fn param_values(&self, name: &str) -> Option<&[String]> {
        self.params.get(name).map(|v| v.as_slice())
    }

    /// Check whether a parameter is present.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Remove a parameter, returning its values.
    pub fn remove_param(&mut self, name: &str) -> Option<Vec<String>> {
        self.params.remove(name)
    }

    /// Iterate over all parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Set the zero-based result offset.
    pub fn set_start(&mut self, start: i64) {
        self.set_param(params::START, start.to_string());
    }

    /// The zero-based result offset, if set.
    pub fn start(&self) -> Option<i64> {
        self.param(params::START).and_then(|v| v.parse().ok())
    }

    /// Set the maximum number of returned documents.
    pub fn set_rows(&mut self, rows: i64) {
        self.set_param(params::ROWS, rows.to_string());
    }

    /// The maximum number of returned documents, if set.
    pub fn rows(&self) -> Option<i64> {
        self.param(params::ROWS).and_then(|v| v.parse().ok())
    }

    /// Append a sort clause. Clauses are comma-joined on the wire in the
    /// order they were added.
    pub fn add_sort(&mut self, field: &str, order: SortOrder) {
        let direction = match order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        self.add_param(params::SORT, format!("{field} {direction}"));
    }

    /// All sort clauses in order.
    pub fn sorts(&self) -> &[String] {
        self.param_values(params::SORT).unwrap_or(&[])
    }

    /// Replace the returned field list.
    pub fn set_fields(&mut self, fields: &[&str]) {
        self.set_param_values(
            params::FIELD_LIST,
            fields.iter().map(|f| f.to_string()).collect(),
        );
    }

    /// Set the request handler.
    pub fn set_handler(&mut self, handler: &str) {
        self.set_param(params::HANDLER, handler);
    }

    /// The request handler, if set.
    pub fn handler(&self) -> Option<&str> {
        self.param(params::HANDLER)
    }

    /// Set the soft execution deadline in milliseconds.
    pub fn set_time_allowed(&mut self, millis: u64) {
        self.set_param(params::TIME_ALLOWED, millis.to_string());
    }

    /// Toggle spellcheck on this query.
    pub fn set_spellcheck(&mut self, enabled: bool) {
        self.set_param(params::SPELLCHECK, enabled.to_string());
    }
}
