//! Response assembly: engine-native responses into the uniform envelope.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::client::DISTANCE_FIELD;
use crate::engine::{
    Collation, NativeDocument, NativeQuery, NativeResponse, QueryMethod, SearchEngine, params,
};
use crate::error::{Error, Result};
use crate::highlight::Highlighter;
use crate::operation::{FacetAttributeResult, QueryRequest, QueryResult, SuggestionHit};
use crate::record::{AttributeValue, ContentType, Record};
use crate::schema::{FieldResolver, SCORE_FIELD};

const METERS_PER_KILOMETER: f64 = 1000.0;

/// Convert facet counts back into attribute space, preserving the engine's
/// bucket order.
pub(crate) fn facet_results(
    resolver: &dyn FieldResolver,
    response: &NativeResponse,
) -> Vec<FacetAttributeResult> {
    response
        .facet_fields
        .iter()
        .map(|field| {
            let mut values = Vec::with_capacity(field.counts.len());
            let mut counts = Vec::with_capacity(field.counts.len());
            for (value, count) in &field.counts {
                values.push(value.clone());
                counts.push(*count);
            }
            FacetAttributeResult::new(resolver.resolve_attribute(&field.field), values, counts)
        })
        .collect()
}

/// Flatten suggester output across dictionaries.
pub(crate) fn suggestion_hits(response: &NativeResponse) -> Vec<SuggestionHit> {
    response
        .suggestions
        .values()
        .flatten()
        .map(|suggestion| SuggestionHit {
            payload: suggestion.payload.clone(),
            term: suggestion.term.clone(),
        })
        .collect()
}

/// Read the partial-results flag from the response header.
pub(crate) fn partial_results(response: &NativeResponse) -> bool {
    if !response.header.partial_results {
        return false;
    }
    let query = response
        .header
        .params
        .get(params::QUERY)
        .map(String::as_str)
        .unwrap_or("unknown");
    debug!(
        num_found = response.num_found,
        query,
        q_time_ms = response.header.q_time_ms,
        "engine returned partial results"
    );
    true
}

/// Outcome of spellcheck evaluation.
///
/// `corrected` carries the requery response when the corrected query found
/// strictly more documents than the original; the caller adopts it with a
/// single assignment. The term lists are populated only on adoption.
#[derive(Debug, Default)]
pub struct SpellcheckOutcome {
    /// Original (misspelled) terms, deduplicated in first-seen order.
    pub did_you_mean: Vec<String>,
    /// Corrected terms, deduplicated in first-seen order.
    pub showing_results_for: Vec<String>,
    /// The requery response to adopt, if any.
    pub corrected: Option<NativeResponse>,
}

/// Pick the collation with the most estimated hits. Earlier collations win
/// ties.
pub(crate) fn best_collation(collations: &[Collation]) -> Option<&Collation> {
    let mut best: Option<&Collation> = None;
    for collation in collations {
        if best.is_none_or(|current| collation.hits > current.hits) {
            best = Some(collation);
        }
    }
    best
}

/// Evaluate the engine's spellcheck collations against the response they
/// came back with.
///
/// When collations are present the best one is resent as the main query
/// clause with spellcheck off, re-running the highlighter pre-query hook on
/// the rewritten query. The requery leaves its mark on `query` either way;
/// adoption is the caller's single assignment from the returned outcome.
pub(crate) fn evaluate_spellcheck(
    engine: &dyn SearchEngine,
    highlighter: &dyn Highlighter,
    request: &QueryRequest,
    query: &mut NativeQuery,
    response: &NativeResponse,
) -> Result<SpellcheckOutcome> {
    let mut outcome = SpellcheckOutcome::default();
    let Some(collation) = best_collation(&response.collations) else {
        return Ok(outcome);
    };

    trace!(
        collation = %collation.query,
        hits = collation.hits,
        "resending best spellcheck collation"
    );
    query.set_query(collation.query.as_str());
    query.set_spellcheck(false);
    highlighter.pre_query(request, query);
    let requery = engine
        .query(query, QueryMethod::Post)
        .map_err(|source| Error::query_execution("Could not complete search query", source))?;

    if requery.documents.len() > response.documents.len() {
        let (did_you_mean, showing_results_for) = correction_terms(&collation.corrections);
        outcome.did_you_mean = did_you_mean;
        outcome.showing_results_for = showing_results_for;
        outcome.corrected = Some(requery);
    }
    Ok(outcome)
}

fn correction_terms(corrections: &[(String, String)]) -> (Vec<String>, Vec<String>) {
    let mut originals: Vec<String> = Vec::new();
    let mut corrected: Vec<String> = Vec::new();
    for (original, correction) in corrections {
        if !originals.contains(original) {
            originals.push(original.clone());
        }
        if !corrected.contains(correction) {
            corrected.push(correction.clone());
        }
    }
    (originals, corrected)
}

/// Convert a matched document into a search hit, reading the ranking
/// pseudo-fields the sort translation may have requested.
pub(crate) fn result_from_document(
    resolver: &dyn FieldResolver,
    document: &NativeDocument,
) -> Result<QueryResult> {
    let record = record_from_document(resolver, document)?;
    let mut result = QueryResult::new(record);

    result.relevance = document
        .first(SCORE_FIELD)
        .and_then(AttributeValue::as_float);

    if let Some(kilometers) = document
        .first(DISTANCE_FIELD)
        .and_then(AttributeValue::as_float)
    {
        trace!(kilometers, "distance returned by engine");
        result.distance_meters = Some(kilometers * METERS_PER_KILOMETER);
    }

    Ok(result)
}

/// Convert a document into a record: resolve the schema, then copy every
/// non-private field back into attribute space.
pub(crate) fn record_from_document(
    resolver: &dyn FieldResolver,
    document: &NativeDocument,
) -> Result<Record> {
    let schema = resolver.record_schema(document)?;
    let mut record = Record::new(schema);
    for (field, values) in document.fields() {
        if resolver.is_private(field) {
            continue;
        }
        record.set_attribute(resolver.resolve_attribute(field), values.to_vec());
    }
    Ok(record)
}

pub(crate) fn records_from_documents(
    resolver: &dyn FieldResolver,
    documents: &[NativeDocument],
) -> Result<Vec<Record>> {
    documents
        .iter()
        .map(|document| record_from_document(resolver, document))
        .collect()
}

/// Collect content types from a pivot response.
///
/// An empty pivot bucket list means no content type has a version; names
/// then come from the first facet field. Buckets without children yield
/// unversioned types, one type per child otherwise.
pub(crate) fn collect_content_types(
    response: &NativeResponse,
    content_types: &mut HashSet<ContentType>,
) {
    for pivot in &response.facet_pivots {
        if pivot.buckets.is_empty() {
            debug!("no versions found for any content type");
            if let Some(field) = response.facet_fields.first() {
                for (name, _) in &field.counts {
                    content_types.insert(ContentType::new(name.clone(), None));
                }
            }
            continue;
        }
        for bucket in &pivot.buckets {
            if bucket.children.is_empty() {
                content_types.insert(ContentType::new(bucket.value.clone(), None));
            } else {
                for child in &bucket.children {
                    content_types.insert(ContentType::new(
                        bucket.value.clone(),
                        Some(child.value.clone()),
                    ));
                }
            }
        }
    }
}
