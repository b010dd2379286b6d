//! Query shaping: paging, sort translation, and the time allowance.
//!
//! Shaping runs after the filter adapter has rendered the main query clause
//! and before the facet and suggestion handlers add theirs. The fetch-all
//! probe happens here: a page size below zero turns into a rows=0 round-trip
//! that reads the match count, then asks for exactly that many rows.

use tracing::{debug, trace};

use crate::client::{ClientConfig, DISTANCE_FIELD, DISTANCE_FUNCTION};
use crate::engine::{NativeQuery, QueryMethod, SearchEngine, params};
use crate::error::{Error, Result};
use crate::filter::GeoPoint;
use crate::operation::{
    CatalogQuery, DISTANCE, RELEVANCE, SortApplication, SortCriterion, SortOrder, TEMPORAL,
};
use crate::record::attributes;
use crate::schema::{FieldKind, FieldResolver, SCORE_FIELD, field_name};

/// Validate the start index and set the offset and row count.
pub(crate) fn apply_paging(
    engine: &dyn SearchEngine,
    config: &ClientConfig,
    query: &mut NativeQuery,
    catalog: &CatalogQuery,
) -> Result<()> {
    if catalog.start_index < 1 {
        return Err(Error::invalid_query("Start index must be greater than 0"));
    }

    // engine offsets are zero-based
    query.set_start(catalog.start_index - 1);

    if wants_entire_result_set(config, catalog) {
        let rows = probe_row_count(engine, query)?;
        query.set_rows(rows);
    } else {
        query.set_rows(catalog.page_size);
    }
    Ok(())
}

fn wants_entire_result_set(config: &ClientConfig, catalog: &CatalogQuery) -> bool {
    if config.zero_page_size_compat {
        catalog.page_size < 1
    } else {
        catalog.page_size < 0
    }
}

/// Ask the engine how many documents match, without fetching any.
fn probe_row_count(engine: &dyn SearchEngine, query: &mut NativeQuery) -> Result<i64> {
    query.set_rows(0);
    let response = engine
        .query(query, QueryMethod::Post)
        .map_err(|source| Error::query_execution("Could not retrieve number of records", source))?;
    debug!(
        num_found = response.num_found,
        "probed match count for fetch-all paging"
    );
    Ok(response.num_found)
}

/// Translate the primary and additional sort criteria, in order, into native
/// sort clauses. Returns the fate of every criterion.
pub(crate) fn apply_sorts(
    resolver: &dyn FieldResolver,
    query: &mut NativeQuery,
    catalog: &CatalogQuery,
) -> Vec<SortApplication> {
    let mut criteria: Vec<&SortCriterion> = Vec::new();
    if let Some(sort) = &catalog.sort {
        criteria.push(sort);
    }
    criteria.extend(catalog.additional_sorts.iter());

    let point = catalog.filter.sort_point();
    let mut applications = Vec::new();
    for criterion in criteria {
        apply_criterion(resolver, query, criterion, point.as_ref(), &mut applications);
    }
    applications
}

fn apply_criterion(
    resolver: &dyn FieldResolver,
    query: &mut NativeQuery,
    criterion: &SortCriterion,
    point: Option<&GeoPoint>,
    applications: &mut Vec<SortApplication>,
) {
    let property = criterion.attribute.as_str();
    let order = criterion.order;

    match property {
        RELEVANCE => {
            query.set_fields(&["*", SCORE_FIELD]);
            query.add_sort(SCORE_FIELD, order);
            applications.push(applied(SCORE_FIELD, order));
        }
        DISTANCE => {
            let geometry = field_name(attributes::GEOGRAPHY, FieldKind::Geometry);
            applications.push(distance_sort(
                query,
                &resolver.sort_key(&geometry),
                order,
                point,
                property,
            ));
        }
        TEMPORAL => {
            match resolver.resolve_field(attributes::EFFECTIVE, Some(FieldKind::Date), false) {
                Some(field) => {
                    let key = resolver.sort_key(&field);
                    query.add_sort(&key, order);
                    applications.push(applied(&key, order));
                }
                None => applications.push(skipped(property, "no effective date field")),
            }
        }
        _ => {
            let fields = resolver.anonymous_fields(property);
            if fields.is_empty() {
                applications.push(skipped(property, "no schema field for sort property"));
                return;
            }
            for field in &fields {
                match FieldKind::of_field(field) {
                    Some(FieldKind::Geometry) => {
                        applications.push(distance_sort(
                            query,
                            &resolver.sort_key(field),
                            order,
                            point,
                            property,
                        ));
                    }
                    Some(kind) if !kind.sortable() => {
                        applications.push(skipped(property, "field kind is not sortable"));
                    }
                    _ => {
                        let key = resolver.sort_key(field);
                        query.add_sort(&key, order);
                        applications.push(applied(&key, order));
                    }
                }
            }
        }
    }
}

/// Sort by distance from the filter's point. Without a point there is
/// nothing to measure from, so the criterion is skipped.
fn distance_sort(
    query: &mut NativeQuery,
    sort_field: &str,
    order: SortOrder,
    point: Option<&GeoPoint>,
    property: &str,
) -> SortApplication {
    let Some(point) = point else {
        return skipped(property, "filter provides no distance point");
    };
    query.add_sort(DISTANCE_FUNCTION, order);
    let distance_field = format!("{DISTANCE_FIELD}:{DISTANCE_FUNCTION}");
    query.set_fields(&["*", distance_field.as_str()]);
    query.add_param(params::SORT_FIELD, sort_field);
    query.add_param(params::POINT, point.to_param());
    applied(DISTANCE_FUNCTION, order)
}

/// Apply the configured soft execution deadline, when one is set.
pub(crate) fn apply_time_allowance(config: &ClientConfig, query: &mut NativeQuery) {
    if config.query_time_allowed_ms > 0 {
        query.set_time_allowed(config.query_time_allowed_ms);
        trace!(
            millis = config.query_time_allowed_ms,
            "applied query time allowance"
        );
    }
}

fn applied(field: &str, order: SortOrder) -> SortApplication {
    SortApplication::Applied {
        field: field.to_string(),
        order,
    }
}

fn skipped(property: &str, reason: &str) -> SortApplication {
    SortApplication::Skipped {
        property: property.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::engine::NativeResponse;
    use crate::filter::Filter;
    use crate::schema::SuffixFieldResolver;

    fn catalog(filter: Filter) -> CatalogQuery {
        CatalogQuery::new(filter)
    }

    #[test]
    fn test_start_index_must_be_positive() {
        let engine = MemoryEngine::new();
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x")).start_index(0);

        let err = apply_paging(&engine, &ClientConfig::default(), &mut query, &catalog)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
        assert_eq!(engine.query_count(), 0);
    }

    #[test]
    fn test_offset_is_zero_based() {
        let engine = MemoryEngine::new();
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x"))
            .start_index(5)
            .page_size(20);

        apply_paging(&engine, &ClientConfig::default(), &mut query, &catalog).unwrap();
        assert_eq!(query.start(), Some(4));
        assert_eq!(query.rows(), Some(20));
        assert_eq!(engine.query_count(), 0);
    }

    #[test]
    fn test_fetch_all_probes_match_count() {
        let engine = MemoryEngine::new();
        engine.enqueue_response(NativeResponse {
            num_found: 42,
            ..NativeResponse::default()
        });
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x")).fetch_all();

        apply_paging(&engine, &ClientConfig::default(), &mut query, &catalog).unwrap();

        let probes = engine.queries();
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].rows(), Some(0));
        assert_eq!(query.rows(), Some(42));
    }

    #[test]
    fn test_zero_page_size_honored_without_compat() {
        let engine = MemoryEngine::new();
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x")).page_size(0);

        apply_paging(&engine, &ClientConfig::default(), &mut query, &catalog).unwrap();
        assert_eq!(query.rows(), Some(0));
        assert_eq!(engine.query_count(), 0);
    }

    #[test]
    fn test_zero_page_size_compat_fetches_all() {
        let engine = MemoryEngine::new();
        engine.enqueue_response(NativeResponse {
            num_found: 3,
            ..NativeResponse::default()
        });
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x")).page_size(0);
        let config = ClientConfig::default().zero_page_size_compat(true);

        apply_paging(&engine, &config, &mut query, &catalog).unwrap();
        assert_eq!(query.rows(), Some(3));
        assert_eq!(engine.query_count(), 1);
    }

    #[test]
    fn test_relevance_sort() {
        let resolver = SuffixFieldResolver::new();
        let mut query = NativeQuery::new("*:*");
        let catalog =
            catalog(Filter::equals("title", "x")).sort(SortCriterion::descending(RELEVANCE));

        let applications = apply_sorts(&resolver, &mut query, &catalog);
        assert_eq!(query.sorts(), ["score desc".to_string()]);
        assert_eq!(
            query.param_values(params::FIELD_LIST).unwrap(),
            ["*".to_string(), "score".to_string()]
        );
        assert_eq!(
            applications,
            vec![SortApplication::Applied {
                field: "score".to_string(),
                order: SortOrder::Descending,
            }]
        );
    }

    #[test]
    fn test_distance_sort_requires_point() {
        let resolver = SuffixFieldResolver::new();
        let mut query = NativeQuery::new("*:*");
        let catalog =
            catalog(Filter::equals("title", "x")).sort(SortCriterion::ascending(DISTANCE));

        let applications = apply_sorts(&resolver, &mut query, &catalog);
        assert!(query.sorts().is_empty());
        assert!(matches!(
            applications.as_slice(),
            [SortApplication::Skipped { property, .. }] if property == DISTANCE
        ));
    }

    #[test]
    fn test_distance_sort_with_point() {
        let resolver = SuffixFieldResolver::new();
        let mut query = NativeQuery::new("*:*");
        let point = GeoPoint::new(45.0, -120.5).unwrap();
        let catalog = catalog(Filter::within_distance("location", point, 10.0))
            .sort(SortCriterion::ascending(DISTANCE));

        let applications = apply_sorts(&resolver, &mut query, &catalog);
        assert_eq!(query.sorts(), ["geodist() asc".to_string()]);
        assert_eq!(query.param(params::SORT_FIELD), Some("location_geo"));
        assert_eq!(query.param(params::POINT), Some("45,-120.5"));
        assert_eq!(
            query.param_values(params::FIELD_LIST).unwrap(),
            ["*".to_string(), "_distance_:geodist()".to_string()]
        );
        assert!(matches!(
            applications.as_slice(),
            [SortApplication::Applied { field, .. }] if field == DISTANCE_FUNCTION
        ));
    }

    #[test]
    fn test_temporal_sort_uses_effective_date() {
        let resolver = SuffixFieldResolver::with_known_fields(["effective_dt"]);
        let mut query = NativeQuery::new("*:*");
        let catalog =
            catalog(Filter::equals("title", "x")).sort(SortCriterion::descending(TEMPORAL));

        apply_sorts(&resolver, &mut query, &catalog);
        assert_eq!(query.sorts(), ["effective_dt desc".to_string()]);
    }

    #[test]
    fn test_anonymous_sort_skips_unsortable_kinds() {
        let resolver =
            SuffixFieldResolver::with_known_fields(["payload_bin", "payload_txt"]);
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x"))
            .sort(SortCriterion::ascending("payload"));

        let applications = apply_sorts(&resolver, &mut query, &catalog);
        // registry order is deterministic: _bin before _txt
        assert!(matches!(
            applications.as_slice(),
            [
                SortApplication::Skipped { .. },
                SortApplication::Applied { field, .. },
            ] if field == "payload_txt_sort"
        ));
        assert_eq!(query.sorts(), ["payload_txt_sort asc".to_string()]);
    }

    #[test]
    fn test_unknown_sort_property_skipped() {
        let resolver = SuffixFieldResolver::new();
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x"))
            .sort(SortCriterion::ascending("nonexistent"));

        let applications = apply_sorts(&resolver, &mut query, &catalog);
        assert!(query.sorts().is_empty());
        assert!(matches!(
            applications.as_slice(),
            [SortApplication::Skipped { property, .. }] if property == "nonexistent"
        ));
    }

    #[test]
    fn test_primary_then_additional_sort_order() {
        let resolver = SuffixFieldResolver::with_known_fields(["created_dt", "page-count_int"]);
        let mut query = NativeQuery::new("*:*");
        let catalog = catalog(Filter::equals("title", "x"))
            .sort(SortCriterion::descending("created"))
            .additional_sort(SortCriterion::ascending("page-count"));

        apply_sorts(&resolver, &mut query, &catalog);
        assert_eq!(
            query.sorts(),
            [
                "created_dt desc".to_string(),
                "page-count_int asc".to_string()
            ]
        );
    }

    #[test]
    fn test_time_allowance_only_when_configured() {
        let mut query = NativeQuery::new("*:*");
        apply_time_allowance(&ClientConfig::default(), &mut query);
        assert!(!query.has_param(params::TIME_ALLOWED));

        let config = ClientConfig::default().query_time_allowed_ms(5_000);
        apply_time_allowance(&config, &mut query);
        assert_eq!(query.param(params::TIME_ALLOWED), Some("5000"));
    }
}
