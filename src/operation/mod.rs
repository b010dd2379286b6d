//! Request and response types for catalog queries.

pub mod request;
pub mod response;

pub use self::request::{
    CatalogQuery, DISTANCE, FacetSort, FacetSpec, QueryOptions, QueryRequest, RELEVANCE,
    RealtimeGet, SortCriterion, SortOrder, SuggestionSpec, TEMPORAL,
};
pub use self::response::{
    FacetAttributeResult, HighlightEntry, QueryResult, ResultEnvelope, SortApplication,
    SuggestionHit, metrics,
};
