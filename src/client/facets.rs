//! Facet and suggestion request translation.

use tracing::debug;

use crate::engine::{NativeQuery, SUGGEST_HANDLER, params};
use crate::operation::{QueryOptions, SuggestionSpec};
use crate::schema::{FieldResolver, SUFFIX_SEPARATOR};

/// Translate the facet spec, when present, onto the native query.
///
/// Attributes map to their first known native field, falling back to the
/// attribute name itself; names without a type suffix are dropped since the
/// engine cannot bucket them. Returns whether the query became a faceted
/// one.
pub(crate) fn apply_facet_request(
    resolver: &dyn FieldResolver,
    query: &mut NativeQuery,
    options: &QueryOptions,
) -> bool {
    let Some(spec) = &options.facet else {
        return false;
    };

    debug!(attributes = ?spec.attributes, "enabling faceted query");
    query.set_param(params::FACET, "true");
    for attribute in &spec.attributes {
        let field = facet_field(resolver, attribute);
        if field.contains(SUFFIX_SEPARATOR) {
            query.add_param(params::FACET_FIELD, field);
        }
    }
    query.set_param(params::FACET_SORT, spec.sort.as_param());
    query.set_param(params::FACET_LIMIT, spec.limit.to_string());
    query.set_param(params::FACET_MIN_COUNT, spec.min_count.to_string());
    true
}

fn facet_field(resolver: &dyn FieldResolver, attribute: &str) -> String {
    resolver
        .anonymous_fields(attribute)
        .into_iter()
        .next()
        .unwrap_or_else(|| attribute.to_string())
}

/// Build the suggestion-only query that replaces the document search
/// wholesale.
pub(crate) fn build_suggestion_query(spec: &SuggestionSpec) -> NativeQuery {
    let mut query = NativeQuery::default();
    query.set_handler(SUGGEST_HANDLER);
    query.set_param(params::SUGGEST_QUERY, spec.query.as_str());
    query.set_param(params::SUGGEST_CONTEXT, spec.context.as_str());
    query.set_param(params::SUGGEST_DICTIONARY, spec.dictionary.as_str());
    if let Some(rebuild) = spec.rebuild {
        query.set_param(params::SUGGEST_BUILD, rebuild.to_string());
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{FacetSort, FacetSpec};
    use crate::schema::SuffixFieldResolver;

    #[test]
    fn test_no_facet_spec_is_not_faceted() {
        let resolver = SuffixFieldResolver::new();
        let mut query = NativeQuery::new("*:*");

        assert!(!apply_facet_request(
            &resolver,
            &mut query,
            &QueryOptions::default()
        ));
        assert!(!query.has_param(params::FACET));
    }

    #[test]
    fn test_facet_fields_resolved_and_filtered() {
        let resolver = SuffixFieldResolver::with_known_fields(["content-type_txt"]);
        let mut query = NativeQuery::new("*:*");
        let options = QueryOptions {
            // "plain" resolves to itself and carries no suffix, so it drops
            facet: Some(
                FacetSpec::new(["content-type", "plain"])
                    .sort(FacetSort::Index)
                    .limit(50)
                    .min_count(2),
            ),
            ..QueryOptions::default()
        };

        assert!(apply_facet_request(&resolver, &mut query, &options));
        assert_eq!(
            query.param_values(params::FACET_FIELD).unwrap(),
            ["content-type_txt".to_string()]
        );
        assert_eq!(query.param(params::FACET), Some("true"));
        assert_eq!(query.param(params::FACET_SORT), Some("index"));
        assert_eq!(query.param(params::FACET_LIMIT), Some("50"));
        assert_eq!(query.param(params::FACET_MIN_COUNT), Some("2"));
    }

    #[test]
    fn test_suggestion_query_replaces_search() {
        let spec = SuggestionSpec::new("ice ag", "workspace", "catalog_suggest");
        let query = build_suggestion_query(&spec);

        assert_eq!(query.handler(), Some(SUGGEST_HANDLER));
        assert_eq!(query.param(params::SUGGEST_QUERY), Some("ice ag"));
        assert_eq!(query.param(params::SUGGEST_CONTEXT), Some("workspace"));
        assert_eq!(
            query.param(params::SUGGEST_DICTIONARY),
            Some("catalog_suggest")
        );
        assert!(!query.has_param(params::SUGGEST_BUILD));
        assert!(query.query().is_none());

        let rebuilt = build_suggestion_query(&spec.rebuild(true));
        assert_eq!(rebuilt.param(params::SUGGEST_BUILD), Some("true"));
    }
}
