// src/extract/mod.rs
// =============================================================================
// This module turns raw rule file text into flattened records.
//
// Submodules:
// - access: Safe dotted-path lookups into a parsed document tree
// - record: Parsing (TOML/YAML) and per-file record construction
//
// This file (mod.rs) is the module root - it re-exports the public API that
// other parts of our application use.
// =============================================================================

mod access;
mod record;

pub use access::resolve_path;
pub use record::{build_record, parse_document, FlatRecord};
