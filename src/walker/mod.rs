// src/walker/mod.rs
// =============================================================================
// This module walks a remote rule tree and collects flattened records.
//
// Features:
// - Depth-first recursion over the repository listing, one request at a time
// - Records come out in listing order, subdirectories in the order the
//   remote lists them
// - Per-file and per-subtree failures become Diagnostic values instead of
//   aborting the run
// =============================================================================

mod walk;

pub use walk::{collect_rules, folder_location, Diagnostic, WalkOutcome};
