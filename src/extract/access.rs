// src/extract/access.rs
// =============================================================================
// Safe nested-field access into a parsed rule document.
//
// A field path like "rule.false_positives.0" names a traversal through the
// document tree: each dot-separated segment is either a mapping key or, when
// the current node is a sequence, a numeric index. Rule files are wildly
// inconsistent about which fields they carry, so the lookup must tolerate a
// missing key, a wrong node type, or an out-of-range index at any step and
// report "absent" instead of failing.
// =============================================================================

use serde_json::Value;

// Resolves a dotted field path against a document root
//
// Parameters:
//   root: the parsed document (mappings, sequences, scalars)
//   path: dotted path, e.g. "metadata.creation_date" or "rule.tags.0"
//
// Returns: Some(value) when every segment resolves, None otherwise.
// The resolved value keeps its native type - string, number, boolean,
// sequence, or nested mapping.
//
// Per segment:
// - On a mapping, the segment is always a literal key lookup. A segment that
//   happens to be all digits is still treated as a key here, never an index.
// - On a sequence, the segment must be all digits and within bounds.
// - On a scalar (or any other mismatch) the lookup is absent.
pub fn resolve_path(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;

    for segment in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
            }
            Value::Array(items) => {
                let index = parse_index(segment)?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }

    Some(current.clone())
}

// Parses a path segment as a sequence index
//
// Only unsigned all-digit segments count ("0", "12"); anything with a sign,
// decimal point, or letters is not an index.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
