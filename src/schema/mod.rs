//! Dynamic schema resolution between abstract attributes and engine fields.
//!
//! The catalog speaks in attribute names (`title`, `effective`, `location`)
//! while the engine speaks in suffix-typed dynamic fields (`title_txt`,
//! `effective_dt`, `location_geo`). [`FieldResolver`] is the oracle the
//! client consults for that mapping, for field privacy, for sortable shadow
//! fields, and for converting records to and from engine documents.

pub mod field;
pub mod resolver;

pub use self::field::{FieldKind, SORT_SUFFIX, SUFFIX_SEPARATOR, base_name, field_name};
pub use self::resolver::{SCHEMA_FIELD, SCORE_FIELD, SuffixFieldResolver};

use crate::engine::NativeDocument;
use crate::error::Result;
use crate::record::Record;

/// Oracle mapping abstract attribute names to and from engine field names.
pub trait FieldResolver: Send + Sync + std::fmt::Debug {
    /// Resolve an attribute to a native field name.
    ///
    /// With `exact` set, only fields actually observed in the schema are
    /// returned; otherwise a name may be synthesized from the attribute and
    /// kind.
    fn resolve_field(&self, attribute: &str, kind: Option<FieldKind>, exact: bool)
    -> Option<String>;

    /// Recover the abstract attribute name from a native field name.
    fn resolve_attribute(&self, field: &str) -> String;

    /// Determine the schema name of a returned document.
    fn record_schema(&self, document: &NativeDocument) -> Result<String>;

    /// All known native fields for an attribute, in deterministic order.
    fn anonymous_fields(&self, attribute: &str) -> Vec<String>;

    /// Whether a field is internal bookkeeping that must not leak into
    /// converted records.
    fn is_private(&self, field: &str) -> bool;

    /// The field to sort on when ordering by the given field.
    fn sort_key(&self, field: &str) -> String;

    /// Write a record's attributes into an engine document.
    fn populate_document(&self, record: &Record, document: &mut NativeDocument) -> Result<()>;
}
