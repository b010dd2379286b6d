//! Well-known attribute names shared between records and query shaping.

/// Record identifier.
pub const ID: &str = "id";

/// Human-readable title.
pub const TITLE: &str = "title";

/// Free-form description.
pub const DESCRIPTION: &str = "description";

/// Creation timestamp.
pub const CREATED: &str = "created";

/// Last-modified timestamp.
pub const MODIFIED: &str = "modified";

/// The point in time the record's content is effective, used by temporal sorting.
pub const EFFECTIVE: &str = "effective";

/// Primary geometry as well-known text, used by distance sorting.
pub const GEOGRAPHY: &str = "location";

/// Content type name.
pub const CONTENT_TYPE: &str = "content-type";

/// Content type version.
pub const CONTENT_TYPE_VERSION: &str = "content-type-version";
