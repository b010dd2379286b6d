//! # Halberd
//!
//! Query translation and response assembly between an abstract catalog query
//! model and a full-text/faceted search engine.
//!
//! ## Features
//!
//! - Engine-agnostic query model with typed facet/suggestion/spellcheck options
//! - Paging, time-limit, and schema-aware sort shaping (relevance, distance, temporal)
//! - Real-time point lookups for identifier queries
//! - Spellcheck-driven requery with deterministic collation selection
//! - Uniform result envelope with per-phase timing metrics
//! - Near-real-time and forced-commit write paths

pub mod client;
pub mod engine;
pub mod error;
pub mod filter;
pub mod highlight;
pub mod operation;
pub mod record;
pub mod schema;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
