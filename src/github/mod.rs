// src/github/mod.rs
// =============================================================================
// This module talks to the GitHub contents API.
//
// It provides:
// - Directory listings (one level of a repository tree per call)
// - File content retrieval, either through the API's base64 JSON envelope
//   or through the raw download URL
// - The RuleRepo trait, so the tree walker never depends on the network
//   directly and tests can inject an in-memory repository
// =============================================================================

mod fetch;

pub use fetch::{parse_repo_slug, DirectoryEntry, EntryKind, GithubClient, RuleRepo};
