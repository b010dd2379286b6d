//! Search engine abstraction: the outbound seam of the catalog client.
//!
//! Implementations translate [`NativeQuery`] parameter maps onto a concrete
//! engine's wire protocol and map its answers back into [`NativeResponse`].
//! The crate ships [`MemoryEngine`], a scripted in-memory implementation used
//! by tests and benchmarks.

pub mod memory;
pub mod query;
pub mod response;

pub use self::memory::{EngineCall, MemoryEngine};
pub use self::query::{GET_HANDLER, NativeQuery, SUGGEST_HANDLER, params};
pub use self::response::{
    Collation, FacetFieldCounts, FacetPivot, NativeDocument, NativeResponse, PivotBucket,
    ResponseHeader, Suggestion,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Transport method for a query round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMethod {
    /// Idempotent retrieval, cacheable by intermediaries.
    Get,
    /// Used for large parameter sets.
    Post,
}

/// How an explicit commit should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPolicy {
    /// Soft commits make changes searchable without flushing segments.
    pub soft: bool,
    /// Block until segment data is flushed.
    pub wait_flush: bool,
    /// Block until a new searcher makes the changes visible.
    pub wait_searcher: bool,
}

impl CommitPolicy {
    /// Soft commit, waiting for visibility.
    pub fn soft() -> Self {
        CommitPolicy {
            soft: true,
            wait_flush: true,
            wait_searcher: true,
        }
    }

    /// Hard commit, waiting for durability and visibility.
    pub fn hard() -> Self {
        CommitPolicy {
            soft: false,
            wait_flush: true,
            wait_searcher: true,
        }
    }
}

/// A blocking search engine connection.
///
/// All calls are synchronous round-trips; timeouts and retries are the
/// implementation's concern.
pub trait SearchEngine: Send + Sync + std::fmt::Debug {
    /// Execute a query and return the engine's full response.
    fn query(&self, query: &NativeQuery, method: QueryMethod) -> EngineResult<NativeResponse>;

    /// Point lookup by identifier, bypassing search ranking.
    fn get_by_ids(&self, ids: &[String]) -> EngineResult<Vec<NativeDocument>>;

    /// Index documents, optionally asking the engine to commit within the
    /// given window.
    fn add(
        &self,
        documents: Vec<NativeDocument>,
        commit_within: Option<Duration>,
    ) -> EngineResult<()>;

    /// Delete documents by identifier.
    fn delete_by_ids(&self, ids: &[String]) -> EngineResult<()>;

    /// Delete documents matching a native query string.
    fn delete_by_query(&self, query: &str) -> EngineResult<()>;

    /// Issue an explicit commit.
    fn commit(&self, policy: CommitPolicy) -> EngineResult<()>;
}
