//! Field typing for suffix-addressed dynamic schemas.
//!
//! The engine stores every attribute under a dynamic field whose suffix
//! encodes the value type (`title_txt`, `created_dt`, `location_geo`).
//! [`FieldKind`] is the closed set of those types together with the suffix
//! table used to classify native field names.

use serde::{Deserialize, Serialize};

/// Separator introducing a type suffix in a native field name.
pub const SUFFIX_SEPARATOR: char = '_';

/// Suffix of the case-normalized shadow field used for sorting text.
pub const SORT_SUFFIX: &str = "_sort";

/// Value type of a dynamic engine field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Tokenized text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// UTC timestamp.
    Date,
    /// Indexed geometry.
    Geometry,
    /// Raw bytes, stored but not searchable.
    Binary,
    /// Opaque serialized object, stored but not searchable.
    Object,
}

impl FieldKind {
    /// The dynamic-field suffix for this kind.
    pub fn suffix(self) -> &'static str {
        match self {
            FieldKind::Text => "_txt",
            FieldKind::Integer => "_int",
            FieldKind::Float => "_flt",
            FieldKind::Boolean => "_bln",
            FieldKind::Date => "_dt",
            FieldKind::Geometry => "_geo",
            FieldKind::Binary => "_bin",
            FieldKind::Object => "_obj",
        }
    }

    /// Classify a native field name by its suffix.
    ///
    /// Sort shadow fields classify as their base kind, so
    /// `title_txt_sort` is still [`FieldKind::Text`].
    pub fn of_field(field: &str) -> Option<FieldKind> {
        let base = field.strip_suffix(SORT_SUFFIX).unwrap_or(field);
        [
            FieldKind::Text,
            FieldKind::Integer,
            FieldKind::Float,
            FieldKind::Boolean,
            FieldKind::Date,
            FieldKind::Geometry,
            FieldKind::Binary,
            FieldKind::Object,
        ]
        .into_iter()
        .find(|kind| base.ends_with(kind.suffix()))
    }

    /// Whether values of this kind can participate in sorting.
    pub fn sortable(self) -> bool {
        !matches!(self, FieldKind::Binary | FieldKind::Object)
    }
}

/// Build the native field name for an attribute and kind.
pub fn field_name(attribute: &str, kind: FieldKind) -> String {
    format!("{attribute}{}", kind.suffix())
}

/// Strip a known type suffix (and any sort shadow suffix) from a native
/// field name, recovering the attribute name.
pub fn base_name(field: &str) -> &str {
    let field = field.strip_suffix(SORT_SUFFIX).unwrap_or(field);
    match FieldKind::of_field(field) {
        Some(kind) => field.strip_suffix(kind.suffix()).unwrap_or(field),
        None => field,
    }
}
