//! Engine-agnostic filter expressions and their rendering to native queries.
//!
//! [`Filter`] is the abstract predicate tree a caller attaches to a query.
//! The catalog client never interprets it beyond two capability probes: the
//! identifier-equality test that enables real-time point lookups, and the
//! extraction of a spatial point for distance sorting. Rendering the tree
//! into the engine's query syntax is the job of a [`FilterAdapter`];
//! [`StandardFilterAdapter`] covers the query syntax of the engine family
//! this crate targets.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::attributes;
use crate::schema::{FieldKind, FieldResolver};

/// A geographical point with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographical point.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::invalid_query(format!(
                "Invalid latitude: {lat} (must be between -90 and 90)"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Error::invalid_query(format!(
                "Invalid longitude: {lon} (must be between -180 and 180)"
            )));
        }

        Ok(GeoPoint { lat, lon })
    }

    /// Render as the engine's `lat,lon` parameter form.
    pub fn to_param(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

/// Engine-agnostic predicate tree describing a search condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Attribute equals a value exactly.
    Equals { attribute: String, value: String },
    /// Attribute matches a pattern (`*` and `?` wildcards).
    Like { attribute: String, pattern: String },
    /// Attribute value lies within an inclusive range; open ends match
    /// everything on that side.
    Range {
        attribute: String,
        lower: Option<String>,
        upper: Option<String>,
    },
    /// Geometry attribute lies within a distance of a point.
    WithinDistance {
        attribute: String,
        point: GeoPoint,
        kilometers: f64,
    },
    /// Geometry attribute intersects a geometry given as well-known text.
    Intersects { attribute: String, wkt: String },
    /// All children match.
    And(Vec<Filter>),
    /// At least one child matches.
    Or(Vec<Filter>),
    /// Child does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// Equality predicate.
    pub fn equals<A: Into<String>, V: Into<String>>(attribute: A, value: V) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Pattern predicate.
    pub fn like<A: Into<String>, P: Into<String>>(attribute: A, pattern: P) -> Self {
        Filter::Like {
            attribute: attribute.into(),
            pattern: pattern.into(),
        }
    }

    /// Inclusive range predicate.
    pub fn range<A: Into<String>>(attribute: A, lower: Option<String>, upper: Option<String>) -> Self {
        Filter::Range {
            attribute: attribute.into(),
            lower,
            upper,
        }
    }

    /// Distance predicate around a point.
    pub fn within_distance<A: Into<String>>(attribute: A, point: GeoPoint, kilometers: f64) -> Self {
        Filter::WithinDistance {
            attribute: attribute.into(),
            point,
            kilometers,
        }
    }

    /// Intersection predicate against well-known text.
    pub fn intersects<A: Into<String>, W: Into<String>>(attribute: A, wkt: W) -> Self {
        Filter::Intersects {
            attribute: attribute.into(),
            wkt: wkt.into(),
        }
    }

    /// Conjunction of filters.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    /// Disjunction of filters.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Negation of a filter.
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Capability test for real-time point lookups: returns the identifier
    /// list when this filter is an identifier equality or a disjunction of
    /// identifier equalities, and nothing otherwise.
    pub fn id_lookup(&self) -> Option<Vec<String>> {
        match self {
            Filter::Equals { attribute, value } if attribute == attributes::ID => {
                Some(vec![value.clone()])
            }
            Filter::Or(children) if !children.is_empty() => {
                let mut ids = Vec::new();
                for child in children {
                    ids.extend(child.id_lookup()?);
                }
                Some(ids)
            }
            _ => None,
        }
    }

    /// The first spatial point mentioned by the filter, used as the
    /// reference point for distance sorting.
    pub fn sort_point(&self) -> Option<GeoPoint> {
        match self {
            Filter::WithinDistance { point, .. } => Some(*point),
            Filter::And(children) | Filter::Or(children) => {
                children.iter().find_map(Filter::sort_point)
            }
            Filter::Not(child) => child.sort_point(),
            _ => None,
        }
    }
}

/// Walks a [`Filter`] tree and renders the engine-native query string.
pub trait FilterAdapter: Send + Sync + std::fmt::Debug {
    /// Render the filter into the engine's query syntax, resolving
    /// attribute names through the given resolver.
    fn adapt(&self, filter: &Filter, resolver: &dyn FieldResolver) -> Result<String>;
}

/// Reference adapter for the targeted engine family's query syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFilterAdapter;

impl StandardFilterAdapter {
    /// Create a new adapter.
    pub fn new() -> Self {
        StandardFilterAdapter
    }

    fn escape(value: &str) -> String {
        value.replace('\\', "\\\\").replace('"', "\\\"")
    }

    fn render(&self, filter: &Filter, resolver: &dyn FieldResolver) -> Result<String> {
        match filter {
            Filter::Equals { attribute, value } => {
                let field = self.field_for(attribute, None, resolver);
                Ok(format!("{field}:\"{}\"", Self::escape(value)))
            }
            Filter::Like { attribute, pattern } => {
                let field = self.field_for(attribute, None, resolver);
                Ok(format!("{field}:({pattern})"))
            }
            Filter::Range {
                attribute,
                lower,
                upper,
            } => {
                let field = self.field_for(attribute, None, resolver);
                let lower = lower.as_deref().unwrap_or("*");
                let upper = upper.as_deref().unwrap_or("*");
                Ok(format!("{field}:[{lower} TO {upper}]"))
            }
            Filter::WithinDistance {
                attribute,
                point,
                kilometers,
            } => {
                let field = self.field_for(attribute, Some(FieldKind::Geometry), resolver);
                Ok(format!(
                    "{{!geofilt sfield={field} pt={} d={kilometers}}}",
                    point.to_param()
                ))
            }
            Filter::Intersects { attribute, wkt } => {
                let field = self.field_for(attribute, Some(FieldKind::Geometry), resolver);
                Ok(format!("{field}:\"Intersects({wkt})\""))
            }
            Filter::And(children) => self.render_children(children, " AND ", resolver),
            Filter::Or(children) => self.render_children(children, " OR ", resolver),
            Filter::Not(child) => {
                let inner = self.render(child, resolver)?;
                Ok(format!("(*:* NOT {inner})"))
            }
        }
    }

    fn render_children(
        &self,
        children: &[Filter],
        joiner: &str,
        resolver: &dyn FieldResolver,
    ) -> Result<String> {
        if children.is_empty() {
            return Err(Error::invalid_query("Empty filter junction"));
        }
        let rendered: Result<Vec<String>> = children
            .iter()
            .map(|child| self.render(child, resolver))
            .collect();
        Ok(format!("({})", rendered?.join(joiner)))
    }

    fn field_for(
        &self,
        attribute: &str,
        kind: Option<FieldKind>,
        resolver: &dyn FieldResolver,
    ) -> String {
        resolver
            .resolve_field(attribute, kind, false)
            .unwrap_or_else(|| attribute.to_string())
    }
}

impl FilterAdapter for StandardFilterAdapter {
    fn adapt(&self, filter: &Filter, resolver: &dyn FieldResolver) -> Result<String> {
        self.render(filter, resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SuffixFieldResolver;

    #[test]
    fn test_id_lookup_detection() {
        let single = Filter::equals(attributes::ID, "a");
        assert_eq!(single.id_lookup(), Some(vec!["a".to_string()]));

        let multiple = Filter::or(vec![
            Filter::equals(attributes::ID, "a"),
            Filter::equals(attributes::ID, "b"),
        ]);
        assert_eq!(
            multiple.id_lookup(),
            Some(vec!["a".to_string(), "b".to_string()])
        );

        let not_ids = Filter::or(vec![
            Filter::equals(attributes::ID, "a"),
            Filter::equals(attributes::TITLE, "b"),
        ]);
        assert_eq!(not_ids.id_lookup(), None);

        let conjunction = Filter::and(vec![Filter::equals(attributes::ID, "a")]);
        assert_eq!(conjunction.id_lookup(), None);
    }

    #[test]
    fn test_sort_point_finds_nested_point() {
        let point = GeoPoint::new(43.25, -79.87).unwrap();
        let filter = Filter::and(vec![
            Filter::like(attributes::TITLE, "harbor*"),
            Filter::within_distance(attributes::GEOGRAPHY, point, 25.0),
        ]);

        assert_eq!(filter.sort_point(), Some(point));
        assert_eq!(Filter::like(attributes::TITLE, "x").sort_point(), None);
    }

    #[test]
    fn test_render_equality_and_junctions() {
        let resolver = SuffixFieldResolver::new();
        let adapter = StandardFilterAdapter::new();

        let filter = Filter::and(vec![
            Filter::equals(attributes::TITLE, "ice \"report\""),
            Filter::not(Filter::equals("content-type", "imagery")),
        ]);

        let rendered = adapter.adapt(&filter, &resolver).unwrap();
        assert_eq!(
            rendered,
            "(title_txt:\"ice \\\"report\\\"\" AND (*:* NOT content-type_txt:\"imagery\"))"
        );
    }

    #[test]
    fn test_render_spatial_and_range() {
        let resolver = SuffixFieldResolver::new();
        let adapter = StandardFilterAdapter::new();

        let point = GeoPoint::new(10.0, 20.0).unwrap();
        let spatial = Filter::within_distance(attributes::GEOGRAPHY, point, 5.0);
        assert_eq!(
            adapter.adapt(&spatial, &resolver).unwrap(),
            "{!geofilt sfield=location_geo pt=10,20 d=5}"
        );

        let open_range = Filter::range("content-type", None, None);
        assert_eq!(
            adapter.adapt(&open_range, &resolver).unwrap(),
            "content-type_txt:[* TO *]"
        );
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_empty_junction_rejected() {
        let resolver = SuffixFieldResolver::new();
        let adapter = StandardFilterAdapter::new();
        assert!(adapter.adapt(&Filter::and(vec![]), &resolver).is_err());
    }
}
