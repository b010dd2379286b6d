//! The catalog client: query translation, execution, and response assembly.
//!
//! [`CatalogClient`] sits between the abstract query model in
//! [`crate::operation`] and a [`SearchEngine`]. A query request flows through
//! translation (filter adapter, shaping, facet and suggestion handlers),
//! one of two execution paths (a standard search or a real-time point
//! lookup), and an assembly pipeline that converts the engine's answer into
//! a [`ResultEnvelope`]. Write traffic (add, delete) routes through the same
//! field resolver in the opposite direction.

mod assemble;
mod facets;
mod shape;

pub use self::assemble::SpellcheckOutcome;
pub use crate::operation::SortApplication;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::engine::{
    CommitPolicy, GET_HANDLER, NativeDocument, NativeQuery, NativeResponse, QueryMethod,
    SearchEngine, params,
};
use crate::error::{Error, Result};
use crate::filter::{FilterAdapter, StandardFilterAdapter};
use crate::highlight::{FieldHighlighter, Highlighter};
use crate::operation::{CatalogQuery, QueryRequest, RealtimeGet, ResultEnvelope, metrics};
use crate::record::{ContentType, Record, attributes};
use crate::schema::{FieldKind, FieldResolver};

/// Pseudo-field the engine fills with the computed distance, in kilometers.
pub(crate) const DISTANCE_FIELD: &str = "_distance_";

/// Engine function computing the distance from the query point.
pub(crate) const DISTANCE_FUNCTION: &str = "geodist()";

/// Maximum identifiers per point-lookup round-trip.
pub const GET_BY_ID_LIMIT: usize = 100;

/// Maximum clauses in one generated delete query.
pub const MAX_BOOLEAN_CLAUSES: usize = 1024;

/// Client tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Record schemas whose writes commit near-real-time.
    pub nrt_schemas: Vec<String>,
    /// Commit window for near-real-time writes, in milliseconds.
    pub nrt_commit_within_ms: u64,
    /// Soft execution deadline applied to every query, in milliseconds.
    /// Zero disables the deadline.
    pub query_time_allowed_ms: u64,
    /// Treat a zero page size as a fetch-all request.
    pub zero_page_size_compat: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            nrt_schemas: Vec::new(),
            nrt_commit_within_ms: 1000,
            query_time_allowed_ms: 0,
            zero_page_size_compat: false,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        ClientConfig::default()
    }

    /// Set the near-real-time schemas from a comma-separated list.
    pub fn nrt_schemas(mut self, schemas: &str) -> Self {
        self.nrt_schemas = schemas
            .split(',')
            .map(str::trim)
            .filter(|schema| !schema.is_empty())
            .map(String::from)
            .collect();
        self
    }

    /// Set the commit window for near-real-time writes.
    pub fn nrt_commit_within_ms(mut self, millis: u64) -> Self {
        self.nrt_commit_within_ms = millis;
        self
    }

    /// Set the per-query soft execution deadline. Zero disables it.
    pub fn query_time_allowed_ms(mut self, millis: u64) -> Self {
        self.query_time_allowed_ms = millis;
        self
    }

    /// Treat a zero page size as a fetch-all request.
    pub fn zero_page_size_compat(mut self, enabled: bool) -> Self {
        self.zero_page_size_compat = enabled;
        self
    }
}

/// Translates catalog queries for a search engine and assembles its answers.
///
/// Collaborators are shared behind [`Arc`], so the client is cheap to clone.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    engine: Arc<dyn SearchEngine>,
    resolver: Arc<dyn FieldResolver>,
    adapter: Arc<dyn FilterAdapter>,
    highlighter: Arc<dyn Highlighter>,
    config: ClientConfig,
}

impl CatalogClient {
    /// Create a client with the standard filter adapter, a disabled
    /// highlighter, and default configuration.
    pub fn new(engine: Arc<dyn SearchEngine>, resolver: Arc<dyn FieldResolver>) -> Self {
        CatalogClient {
            engine,
            resolver,
            adapter: Arc::new(StandardFilterAdapter::new()),
            highlighter: Arc::new(FieldHighlighter::default()),
            config: ClientConfig::default(),
        }
    }

    /// Replace the filter adapter.
    pub fn with_adapter(mut self, adapter: Arc<dyn FilterAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Replace the highlighter.
    pub fn with_highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a catalog query end to end.
    ///
    /// A request without a query yields an empty envelope without touching
    /// the engine. Engine failures abort the whole query; per-phase timings
    /// ride back in the envelope's metrics map.
    pub fn query(&self, request: &QueryRequest) -> Result<ResultEnvelope> {
        let Some(catalog) = request.query.as_ref() else {
            return Ok(ResultEnvelope::empty());
        };
        request.options.validate()?;

        let trace_id = request.trace_id.unwrap_or_else(Uuid::new_v4);
        let mut timings = BTreeMap::new();
        let query_started = Instant::now();

        trace!(%trace_id, "generating native query");
        let mut phase = Instant::now();
        let (mut query, sorts) = self.build_native_query(request)?;
        record_elapsed(&mut timings, metrics::BUILD, phase);
        for application in &sorts {
            if let SortApplication::Skipped { property, reason } = application {
                debug!(%trace_id, property, reason, "sort criterion skipped");
            }
        }

        phase = Instant::now();
        let is_faceted =
            facets::apply_facet_request(self.resolver.as_ref(), &mut query, &request.options);
        record_elapsed(&mut timings, metrics::FACET_REQUEST, phase);

        phase = Instant::now();
        if let Some(spec) = &request.options.suggestion {
            query = facets::build_suggestion_query(spec);
        }
        record_elapsed(&mut timings, metrics::SUGGESTION_REQUEST, phase);

        let spellcheck_on = request.options.spellcheck;

        let mut response;
        if !is_faceted && should_do_realtime_get(catalog, request.options.realtime) {
            debug!(%trace_id, "performing point lookup");
            phase = Instant::now();
            let ids = catalog.filter.id_lookup().unwrap_or_default();
            let realtime = realtime_query(&query, &ids);
            response = self.execute(&realtime)?;
            record_elapsed(&mut timings, metrics::REALTIME_EXECUTE, phase);
        } else {
            if spellcheck_on {
                query.set_spellcheck(true);
            }
            phase = Instant::now();
            self.highlighter.pre_query(request, &mut query);
            record_elapsed(&mut timings, metrics::HIGHLIGHT_PRE, phase);

            debug!(%trace_id, "executing query");
            phase = Instant::now();
            response = self.execute(&query)?;
            record_elapsed(&mut timings, metrics::EXECUTE, phase);
        }

        let mut envelope = ResultEnvelope::empty();
        envelope.sort_applications = sorts;

        if is_faceted {
            phase = Instant::now();
            envelope.facets = assemble::facet_results(self.resolver.as_ref(), &response);
            record_elapsed(&mut timings, metrics::FACET_RESPONSE, phase);
        }

        phase = Instant::now();
        envelope.suggestions = assemble::suggestion_hits(&response);
        record_elapsed(&mut timings, metrics::SUGGESTION_RESPONSE, phase);

        // the partial flag always reflects the first round-trip
        phase = Instant::now();
        envelope.partial = assemble::partial_results(&response);
        record_elapsed(&mut timings, metrics::PARTIAL_RESULTS, phase);

        phase = Instant::now();
        if spellcheck_on {
            let outcome = assemble::evaluate_spellcheck(
                self.engine.as_ref(),
                self.highlighter.as_ref(),
                request,
                &mut query,
                &response,
            )?;
            envelope.did_you_mean = outcome.did_you_mean;
            envelope.showing_results_for = outcome.showing_results_for;
            if let Some(corrected) = outcome.corrected {
                response = corrected;
            }
        }
        record_elapsed(&mut timings, metrics::SPELLCHECK, phase);

        if !response.highlighting.is_empty() {
            phase = Instant::now();
            self.highlighter.post_query(&response, &mut envelope);
            record_elapsed(&mut timings, metrics::HIGHLIGHT, phase);
        }

        for document in &response.documents {
            envelope
                .results
                .push(assemble::result_from_document(self.resolver.as_ref(), document)?);
        }
        envelope.total_hits = response.num_found;

        record_elapsed(&mut timings, metrics::TOTAL, query_started);
        envelope.metrics = timings;
        trace!(%trace_id, hits = envelope.total_hits, "query complete");
        Ok(envelope)
    }

    /// Translate a request into the native query it would execute, returning
    /// the fate of each requested sort criterion alongside.
    ///
    /// A fetch-all page size costs one probe round-trip here, carrying the
    /// paging offset but none of the later shaping.
    pub fn build_native_query(
        &self,
        request: &QueryRequest,
    ) -> Result<(NativeQuery, Vec<SortApplication>)> {
        let catalog = request
            .query
            .as_ref()
            .ok_or_else(|| Error::invalid_query("Query request carries no query"))?;

        let clause = self.adapter.adapt(&catalog.filter, self.resolver.as_ref())?;
        trace!(%clause, "adapted filter");

        let mut query = NativeQuery::new(clause);
        shape::apply_paging(self.engine.as_ref(), &self.config, &mut query, catalog)?;
        let sorts = shape::apply_sorts(self.resolver.as_ref(), &mut query, catalog);
        shape::apply_time_allowance(&self.config, &mut query);
        Ok((query, sorts))
    }

    /// Run a bare native query string and convert the hits.
    pub fn query_text(&self, query_text: &str) -> Result<Vec<Record>> {
        let query = NativeQuery::new(query_text);
        let response = self.execute(&query)?;
        assemble::records_from_documents(self.resolver.as_ref(), &response.documents)
    }

    /// Fetch records by identifier through the engine's point-lookup path,
    /// in batches of [`GET_BY_ID_LIMIT`].
    pub fn records_by_ids(&self, ids: &[String]) -> Result<Vec<Record>> {
        let mut documents = Vec::with_capacity(ids.len());
        for batch in ids.chunks(GET_BY_ID_LIMIT) {
            let page = self.engine.get_by_ids(batch).map_err(|source| {
                Error::query_execution("Could not complete search query", source)
            })?;
            documents.extend(page);
        }
        assemble::records_from_documents(self.resolver.as_ref(), &documents)
    }

    /// Enumerate the content types present in the index.
    ///
    /// Engine failures are logged and swallowed; the caller gets whatever
    /// was collected.
    pub fn content_types(&self) -> HashSet<ContentType> {
        let mut content_types = HashSet::new();

        let type_field =
            self.resolver
                .resolve_field(attributes::CONTENT_TYPE, Some(FieldKind::Text), true);
        let version_field = self.resolver.resolve_field(
            attributes::CONTENT_TYPE_VERSION,
            Some(FieldKind::Text),
            true,
        );
        // an unknown field means nothing of that kind was ever indexed
        let (Some(type_field), Some(version_field)) = (type_field, version_field) else {
            return content_types;
        };

        let mut query = NativeQuery::new(format!("{type_field}:[* TO *]"));
        query.set_param(params::FACET, "true");
        query.add_param(params::FACET_FIELD, type_field.as_str());
        query.add_param(params::FACET_PIVOT, format!("{type_field},{version_field}"));

        match self.engine.query(&query, QueryMethod::Post) {
            Ok(response) => assemble::collect_content_types(&response, &mut content_types),
            Err(error) => warn!(%error, "content type enumeration failed"),
        }
        content_types
    }

    /// Index records, returning the documents written.
    ///
    /// Writes touching a near-real-time schema carry the configured commit
    /// window. A forced commit issues a soft commit after the add so the
    /// records become searchable immediately.
    pub fn add(&self, records: &[Record], force_commit: bool) -> Result<Vec<NativeDocument>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::with_capacity(records.len());
        let mut nrt = false;
        for record in records {
            let mut document = NativeDocument::new();
            self.resolver.populate_document(record, &mut document)?;
            nrt = nrt
                || self
                    .config
                    .nrt_schemas
                    .iter()
                    .any(|schema| schema == record.schema());
            documents.push(document);
        }

        debug!(count = documents.len(), nrt, force_commit, "adding documents");
        if force_commit {
            self.engine.add(documents.clone(), None)?;
            self.engine.commit(CommitPolicy::soft())?;
        } else if nrt {
            self.engine.add(
                documents.clone(),
                Some(Duration::from_millis(self.config.nrt_commit_within_ms)),
            )?;
        } else {
            self.engine.add(documents.clone(), None)?;
        }
        Ok(documents)
    }

    /// Delete records whose `attribute` equals one of `values`.
    ///
    /// Identifier deletes use the engine's native delete-by-id path; any
    /// other attribute deletes through generated clause queries, batched at
    /// [`MAX_BOOLEAN_CLAUSES`] clauses.
    pub fn delete_by_ids(
        &self,
        attribute: &str,
        values: &[String],
        force_commit: bool,
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        if attribute == attributes::ID {
            self.engine.delete_by_ids(values)?;
        } else {
            for batch in values.chunks(MAX_BOOLEAN_CLAUSES) {
                self.engine
                    .delete_by_query(&identifier_query(attribute, batch))?;
            }
        }

        if force_commit {
            self.engine.commit(CommitPolicy::hard())?;
        }
        Ok(())
    }

    /// Delete records matching a native query string.
    pub fn delete_by_query(&self, query: &str) -> Result<()> {
        self.engine.delete_by_query(query)?;
        Ok(())
    }

    fn execute(&self, query: &NativeQuery) -> Result<NativeResponse> {
        self.engine
            .query(query, QueryMethod::Post)
            .map_err(|source| Error::query_execution("Could not complete search query", source))
    }
}

/// The point-lookup path serves only the first page, so any explicit paging
/// rules it out; beyond that it takes either the explicit hint or a filter
/// that is recognizably an identifier lookup.
fn should_do_realtime_get(catalog: &CatalogQuery, realtime: RealtimeGet) -> bool {
    match realtime {
        RealtimeGet::Never => false,
        _ if catalog.start_index > 1 => false,
        RealtimeGet::Always => true,
        RealtimeGet::Auto => catalog.filter.id_lookup().is_some(),
    }
}

/// Rewrite a shaped query into a point lookup: every parameter carries over,
/// the main query clause becomes a filter query, and the identifiers ride
/// along for the get handler.
fn realtime_query(original: &NativeQuery, ids: &[String]) -> NativeQuery {
    let mut realtime = NativeQuery::default();
    for (name, values) in original.iter() {
        if name == params::QUERY {
            realtime.set_param_values(params::FILTER_QUERY, values.to_vec());
        } else {
            realtime.set_param_values(name, values.to_vec());
        }
    }
    realtime.set_handler(GET_HANDLER);
    realtime.set_param_values(params::IDS, ids.to_vec());
    realtime
}

fn identifier_query(attribute: &str, values: &[String]) -> String {
    let clauses: Vec<String> = values
        .iter()
        .map(|value| format!("{attribute}:\"{value}\""))
        .collect();
    clauses.join(" OR ")
}

fn record_elapsed(timings: &mut BTreeMap<String, u64>, phase: &str, started: Instant) {
    timings.insert(metrics::key(phase), started.elapsed().as_nanos() as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::filter::Filter;
    use crate::operation::SortOrder;
    use crate::schema::SuffixFieldResolver;

    fn client(engine: Arc<MemoryEngine>) -> CatalogClient {
        CatalogClient::new(engine, Arc::new(SuffixFieldResolver::new()))
    }

    #[test]
    fn test_request_without_query_skips_engine() {
        let engine = Arc::new(MemoryEngine::new());
        let envelope = client(engine.clone()).query(&QueryRequest::empty()).unwrap();

        assert!(envelope.results.is_empty());
        assert_eq!(envelope.total_hits, 0);
        assert!(!envelope.partial);
        assert_eq!(engine.query_count(), 0);
    }

    #[test]
    fn test_realtime_eligibility() {
        let by_id = CatalogQuery::new(Filter::equals(attributes::ID, "doc-1"));
        let by_title = CatalogQuery::new(Filter::equals("title", "survey"));

        assert!(should_do_realtime_get(&by_id, RealtimeGet::Auto));
        assert!(!should_do_realtime_get(&by_title, RealtimeGet::Auto));
        assert!(should_do_realtime_get(&by_title, RealtimeGet::Always));
        assert!(!should_do_realtime_get(&by_id, RealtimeGet::Never));

        let paged = CatalogQuery::new(Filter::equals(attributes::ID, "doc-1")).start_index(2);
        assert!(!should_do_realtime_get(&paged, RealtimeGet::Auto));
        assert!(!should_do_realtime_get(&paged, RealtimeGet::Always));
    }

    #[test]
    fn test_realtime_query_rewrites_main_clause() {
        let mut original = NativeQuery::new("id_txt:\"doc-1\"");
        original.set_rows(10);
        original.add_sort("created_dt", SortOrder::Descending);

        let ids = vec!["doc-1".to_string(), "doc-2".to_string()];
        let realtime = realtime_query(&original, &ids);

        assert_eq!(realtime.handler(), Some(GET_HANDLER));
        assert!(realtime.query().is_none());
        assert_eq!(
            realtime.param_values(params::FILTER_QUERY).unwrap(),
            ["id_txt:\"doc-1\"".to_string()]
        );
        assert_eq!(realtime.param_values(params::IDS).unwrap(), ids.as_slice());
        assert_eq!(realtime.rows(), Some(10));
        assert_eq!(realtime.sorts(), ["created_dt desc".to_string()]);
    }

    #[test]
    fn test_identifier_query_format() {
        let values = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            identifier_query("checksum", &values),
            "checksum:\"a\" OR checksum:\"b\""
        );
    }

    #[test]
    fn test_nrt_schema_csv_parsing() {
        let config = ClientConfig::new().nrt_schemas(" registry.entry , , workspace ");
        assert_eq!(
            config.nrt_schemas,
            ["registry.entry".to_string(), "workspace".to_string()]
        );
        assert_eq!(config.nrt_commit_within_ms, 1000);
    }

    #[test]
    fn test_facet_and_suggestion_rejected_together() {
        use crate::operation::{FacetSpec, SuggestionSpec};

        let engine = Arc::new(MemoryEngine::new());
        let request = QueryRequest::new(CatalogQuery::new(Filter::equals("title", "x")))
            .facet(FacetSpec::new(["content-type"]))
            .suggestion(SuggestionSpec::new("q", "ctx", "dict"));

        let err = client(engine.clone()).query(&request).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
        assert_eq!(engine.query_count(), 0);
    }
}
