//! In-memory scripted engine for tests and benchmarks.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;

use crate::engine::{
    CommitPolicy, NativeDocument, NativeQuery, NativeResponse, QueryMethod, SearchEngine,
};
use crate::error::{EngineError, EngineResult};

/// One recorded engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Query {
        query: NativeQuery,
        method: QueryMethod,
    },
    GetByIds {
        ids: Vec<String>,
    },
    Add {
        documents: Vec<NativeDocument>,
        commit_within: Option<Duration>,
    },
    DeleteByIds {
        ids: Vec<String>,
    },
    DeleteByQuery {
        query: String,
    },
    Commit {
        policy: CommitPolicy,
    },
}

#[derive(Debug, Default)]
struct State {
    responses: VecDeque<EngineResult<NativeResponse>>,
    documents: BTreeMap<String, NativeDocument>,
    calls: Vec<EngineCall>,
    next_get_failure: Option<EngineError>,
    next_write_failure: Option<EngineError>,
}

/// Scripted engine: query responses are served from a queue in enqueue
/// order, point lookups are served from an id-keyed document store, and
/// every invocation is recorded for assertions.
///
/// An exhausted response queue serves empty responses rather than failing,
/// which keeps incidental probes out of test scripts.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: Mutex<State>,
}

impl MemoryEngine {
    /// Create a new engine with nothing scripted.
    pub fn new() -> Self {
        MemoryEngine::default()
    }

    /// Queue a response for the next query round-trip.
    pub fn enqueue_response(&self, response: NativeResponse) {
        self.state.lock().responses.push_back(Ok(response));
    }

    /// Queue a failure for the next query round-trip.
    pub fn enqueue_error(&self, error: EngineError) {
        self.state.lock().responses.push_back(Err(error));
    }

    /// Stock a document for point lookups under the given identifier.
    pub fn insert_document<S: Into<String>>(&self, id: S, document: NativeDocument) {
        self.state.lock().documents.insert(id.into(), document);
    }

    /// Fail the next point lookup.
    pub fn fail_next_get_by_ids(&self, error: EngineError) {
        self.state.lock().next_get_failure = Some(error);
    }

    /// Fail the next write operation (add, delete, commit).
    pub fn fail_next_write(&self, error: EngineError) {
        self.state.lock().next_write_failure = Some(error);
    }

    /// All recorded calls in invocation order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// The queries recorded by query round-trips, in order.
    pub fn queries(&self) -> Vec<NativeQuery> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Query { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of query round-trips recorded.
    pub fn query_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Query { .. }))
            .count()
    }

    fn take_write_failure(state: &mut State) -> EngineResult<()> {
        match state.next_write_failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl SearchEngine for MemoryEngine {
    fn query(&self, query: &NativeQuery, method: QueryMethod) -> EngineResult<NativeResponse> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Query {
            query: query.clone(),
            method,
        });
        match state.responses.pop_front() {
            Some(result) => result,
            None => Ok(NativeResponse::default()),
        }
    }

    fn get_by_ids(&self, ids: &[String]) -> EngineResult<Vec<NativeDocument>> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::GetByIds { ids: ids.to_vec() });
        if let Some(error) = state.next_get_failure.take() {
            return Err(error);
        }
        Ok(ids
            .iter()
            .filter_map(|id| state.documents.get(id).cloned())
            .collect())
    }

    fn add(
        &self,
        documents: Vec<NativeDocument>,
        commit_within: Option<Duration>,
    ) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Add {
            documents,
            commit_within,
        });
        Self::take_write_failure(&mut state)
    }

    fn delete_by_ids(&self, ids: &[String]) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::DeleteByIds { ids: ids.to_vec() });
        Self::take_write_failure(&mut state)
    }

    fn delete_by_query(&self, query: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::DeleteByQuery {
            query: query.to_string(),
        });
        Self::take_write_failure(&mut state)
    }

    fn commit(&self, policy: CommitPolicy) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Commit { policy });
        Self::take_write_failure(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AttributeValue;

    #[test]
    fn test_scripted_responses_in_order() {
        let engine = MemoryEngine::new();
        engine.enqueue_response(NativeResponse {
            num_found: 7,
            ..NativeResponse::default()
        });
        engine.enqueue_error(EngineError::transport("down"));

        let query = NativeQuery::new("*:*");
        let first = engine.query(&query, QueryMethod::Post).unwrap();
        assert_eq!(first.num_found, 7);

        let second = engine.query(&query, QueryMethod::Post);
        assert!(second.is_err());

        // exhausted queue serves empty responses
        let third = engine.query(&query, QueryMethod::Post).unwrap();
        assert_eq!(third.num_found, 0);
        assert_eq!(engine.query_count(), 3);
    }

    #[test]
    fn test_point_lookup_preserves_id_order() {
        let engine = MemoryEngine::new();
        let mut doc = NativeDocument::new();
        doc.add_value("id_txt", AttributeValue::Text("b".to_string()));
        engine.insert_document("b", doc.clone());

        let mut other = NativeDocument::new();
        other.add_value("id_txt", AttributeValue::Text("a".to_string()));
        engine.insert_document("a", other);

        let ids = vec!["b".to_string(), "missing".to_string(), "a".to_string()];
        let docs = engine.get_by_ids(&ids).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(
            docs[0].first("id_txt").and_then(AttributeValue::as_text),
            Some("b")
        );
    }
}
