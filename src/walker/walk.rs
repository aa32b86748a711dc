// src/walker/walk.rs
// =============================================================================
// Depth-first traversal of a remote rule repository.
//
// How it works:
// 1. List the directory at the current URL
// 2. For each entry, in listing order:
//    - directory: recurse and append the child records
//    - matching rule file: fetch, parse, extract one record
//    - anything else (wrong extension, symlink): skip silently
// 3. Failures never stop the run: a listing failure costs that subtree, a
//    fetch or parse failure costs that file, and each leaves a Diagnostic
//    behind for the operator
//
// The recursion is async (every level does network I/O), so the recursive
// call is boxed with BoxFuture.
// =============================================================================

use std::fmt;

use futures::future::{BoxFuture, FutureExt};

use crate::config::ExportConfig;
use crate::extract::{build_record, FlatRecord};
use crate::github::{DirectoryEntry, EntryKind, RuleRepo};

// A non-fatal failure observed during the walk
//
// Field-level resolution failures are NOT diagnostics - a missing field is
// normal and just produces an absent/empty value in the record.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A directory listing returned non-success; its subtree contributed
    /// zero records
    ListingFailed { url: String, detail: String },
    /// A file's content could not be retrieved (or came back empty)
    FetchFailed { file: String, detail: String },
    /// A file's content did not parse; carries the raw content so the
    /// operator can inspect what came back
    ParseFailed {
        file: String,
        detail: String,
        content: String,
    },
    /// A file was skipped because it is on the static exclusion list
    Excluded { file: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ListingFailed { url, detail } => {
                write!(f, "Failed to list {}: {}", url, detail)
            }
            Diagnostic::FetchFailed { file, detail } => {
                write!(f, "Skipping {}: {}", file, detail)
            }
            Diagnostic::ParseFailed { file, detail, content } => {
                write!(f, "Error parsing {}: {}\n--- content ---\n{}", file, detail, content)
            }
            Diagnostic::Excluded { file } => {
                write!(f, "Skipping {} as it is in the exclusion list", file)
            }
        }
    }
}

// Everything a walk produces
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// One record per successfully extracted rule file, in listing order
    pub records: Vec<FlatRecord>,
    /// Non-fatal failures, in the order they were observed
    pub diagnostics: Vec<Diagnostic>,
}

// Walks the configured tree and collects all rule records
//
// Parameters:
//   repo: the remote repository collaborator
//   config: export configuration (root URL, filters, field list, ...)
//
// Never fails: a listing failure at the root simply yields an outcome with
// zero records and one diagnostic.
pub async fn collect_rules<R: RuleRepo>(repo: &R, config: &ExportConfig) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let records = walk_directory(repo, config, config.root_url.clone(), &mut outcome.diagnostics).await;
    outcome.records = records;
    outcome
}

// Recursively processes one directory level
//
// Returns the records found at or below the directory, depth-first, in
// listing order.
fn walk_directory<'a, R: RuleRepo>(
    repo: &'a R,
    config: &'a ExportConfig,
    url: String,
    diagnostics: &'a mut Vec<Diagnostic>,
) -> BoxFuture<'a, Vec<FlatRecord>> {
    async move {
        let entries = match repo.list_directory(&url).await {
            Ok(entries) => entries,
            Err(e) => {
                diagnostics.push(Diagnostic::ListingFailed {
                    url,
                    detail: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut records = Vec::new();

        for entry in entries {
            match entry.kind {
                EntryKind::Dir => {
                    let child =
                        walk_directory(repo, config, entry.url.clone(), diagnostics).await;
                    records.extend(child);
                }
                EntryKind::File if entry.name.ends_with(&config.extension) => {
                    if config.excluded_files.iter().any(|name| name == &entry.name) {
                        diagnostics.push(Diagnostic::Excluded {
                            file: entry.name.clone(),
                        });
                        continue;
                    }

                    if let Some(record) = process_file(repo, config, &entry, diagnostics).await {
                        records.push(record);
                    }
                }
                // Wrong extension, symlinks, submodules: nothing to do
                _ => {}
            }
        }

        records
    }
    .boxed()
}

// Fetches and extracts a single rule file
//
// Returns None when the file is skipped; the reason is already in
// diagnostics by then.
async fn process_file<R: RuleRepo>(
    repo: &R,
    config: &ExportConfig,
    entry: &DirectoryEntry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<FlatRecord> {
    let text = match repo.fetch_content(entry, config.fetch_mode).await {
        Ok(text) => text,
        Err(e) => {
            diagnostics.push(Diagnostic::FetchFailed {
                file: entry.name.clone(),
                detail: e.to_string(),
            });
            return None;
        }
    };

    if text.trim().is_empty() {
        diagnostics.push(Diagnostic::FetchFailed {
            file: entry.name.clone(),
            detail: "content is empty".to_string(),
        });
        return None;
    }

    println!("   Fetching and parsing {}...", entry.name);

    let location = folder_location(&entry.path, config.folder_marker.as_deref());

    match build_record(config, &text, &location, &entry.name) {
        Ok(record) => Some(record),
        Err(e) => {
            diagnostics.push(Diagnostic::ParseFailed {
                file: entry.name.clone(),
                detail: e.to_string(),
                content: text,
            });
            None
        }
    }
}

// Derives the folder-location column from a file's repository path
//
// Takes the directory portion of the path; when a marker is configured and
// present, keeps only what follows its first occurrence. A directory without
// the marker is used as-is - the output does not distinguish the two cases.
//
// Example: "rules/windows/rules/process_creation/foo.toml" with marker
// "/rules/" -> "process_creation"
pub fn folder_location(path: &str, marker: Option<&str>) -> String {
    let directory = match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    };

    match marker {
        Some(marker) => match directory.split_once(marker) {
            Some((_, after)) => after.to_string(),
            None => directory.to_string(),
        },
        None => directory.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportConfig, FetchMode, FILE_COLUMN};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // In-memory repository: listings keyed by URL, contents keyed by the
    // file entry's URL. Also records which files were actually fetched.
    #[derive(Default)]
    struct MockRepo {
        listings: HashMap<String, Vec<DirectoryEntry>>,
        contents: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl MockRepo {
        fn with_listing(mut self, url: &str, entries: Vec<DirectoryEntry>) -> Self {
            self.listings.insert(url.to_string(), entries);
            self
        }

        fn with_content(mut self, url: &str, content: &str) -> Self {
            self.contents.insert(url.to_string(), content.to_string());
            self
        }

        fn fetched_files(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RuleRepo for MockRepo {
        async fn list_directory(&self, url: &str) -> Result<Vec<DirectoryEntry>> {
            self.listings
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("Status code: 404"))
        }

        async fn fetch_content(&self, entry: &DirectoryEntry, _mode: FetchMode) -> Result<String> {
            self.fetched.lock().unwrap().push(entry.name.clone());
            self.contents
                .get(&entry.url)
                .cloned()
                .ok_or_else(|| anyhow!("Status code: 404"))
        }
    }

    fn dir(name: &str, path: &str, url: &str) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::Dir,
            url: url.to_string(),
            download_url: None,
        }
    }

    fn file(name: &str, path: &str, url: &str) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
            url: url.to_string(),
            download_url: Some(format!("https://raw.test/{}", path)),
        }
    }

    fn toml_rule(name: &str) -> String {
        format!("[rule]\nname = \"{}\"\n", name)
    }

    fn test_config(root_url: &str) -> ExportConfig {
        let mut config = ExportConfig::elastic();
        config.root_url = root_url.to_string();
        config
    }

    #[tokio::test]
    async fn test_depth_first_listing_order() {
        let repo = MockRepo::default()
            .with_listing(
                "root",
                vec![
                    dir("d1", "rules/d1", "d1"),
                    dir("d2", "rules/d2", "d2"),
                ],
            )
            .with_listing("d1", vec![file("a.toml", "rules/d1/a.toml", "f-a")])
            .with_listing("d2", vec![file("b.toml", "rules/d2/b.toml", "f-b")])
            .with_content("f-a", &toml_rule("first"))
            .with_content("f-b", &toml_rule("second"));

        let outcome = collect_rules(&repo, &test_config("root")).await;

        assert!(outcome.diagnostics.is_empty());
        let names: Vec<_> = outcome
            .records
            .iter()
            .map(|r| r.value(FILE_COLUMN).cloned().unwrap())
            .collect();
        assert_eq!(names, vec![json!("a.toml"), json!("b.toml")]);
    }

    #[tokio::test]
    async fn test_non_matching_extension_is_skipped() {
        let repo = MockRepo::default()
            .with_listing(
                "root",
                vec![
                    file("a.toml", "rules/a.toml", "f-a"),
                    file("README.md", "rules/README.md", "f-md"),
                    file("b.toml", "rules/b.toml", "f-b"),
                ],
            )
            .with_content("f-a", &toml_rule("a"))
            .with_content("f-b", &toml_rule("b"));

        let outcome = collect_rules(&repo, &test_config("root")).await;

        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.diagnostics.is_empty());
        // The non-matching file was never even fetched
        assert_eq!(repo.fetched_files(), vec!["a.toml", "b.toml"]);
    }

    #[tokio::test]
    async fn test_excluded_file_is_not_fetched() {
        let mut config = ExportConfig::sigma();
        config.root_url = "root".to_string();

        let repo = MockRepo::default()
            .with_listing(
                "root",
                vec![
                    file(
                        "driver_load_win_mal_drivers.yml",
                        "rules/driver_load_win_mal_drivers.yml",
                        "f-excluded",
                    ),
                    file("ok.yml", "rules/ok.yml", "f-ok"),
                ],
            )
            .with_content("f-excluded", "title: should never be read\n")
            .with_content("f-ok", "title: fine\n");

        let outcome = collect_rules(&repo, &config).await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::Excluded {
                file: "driver_load_win_mal_drivers.yml".to_string()
            }]
        );
        // Exclusion happens before any fetch attempt
        assert_eq!(repo.fetched_files(), vec!["ok.yml"]);
    }

    #[tokio::test]
    async fn test_same_name_outside_exclusion_list_is_processed() {
        let mut config = ExportConfig::sigma();
        config.root_url = "root".to_string();
        config.excluded_files = vec!["other.yml".to_string()];

        let repo = MockRepo::default()
            .with_listing(
                "root",
                vec![file(
                    "driver_load_win_mal_drivers.yml",
                    "rules/driver_load_win_mal_drivers.yml",
                    "f-1",
                )],
            )
            .with_content("f-1", "title: now allowed\n");

        let outcome = collect_rules(&repo, &config).await;
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_loses_only_that_subtree() {
        let repo = MockRepo::default()
            .with_listing(
                "root",
                vec![
                    dir("broken", "rules/broken", "missing-listing"),
                    file("a.toml", "rules/a.toml", "f-a"),
                ],
            )
            .with_content("f-a", &toml_rule("a"));

        let outcome = collect_rules(&repo, &test_config("root")).await;

        assert_eq!(outcome.records.len(), 1);
        assert!(matches!(
            outcome.diagnostics[0],
            Diagnostic::ListingFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_root_listing_failure_yields_empty_outcome() {
        let repo = MockRepo::default();
        let outcome = collect_rules(&repo, &test_config("nowhere")).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_file() {
        let repo = MockRepo::default().with_listing(
            "root",
            vec![file("gone.toml", "rules/gone.toml", "no-content")],
        );

        let outcome = collect_rules(&repo, &test_config("root")).await;

        assert!(outcome.records.is_empty());
        assert!(matches!(
            outcome.diagnostics[0],
            Diagnostic::FetchFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_content_counts_as_fetch_failure() {
        let repo = MockRepo::default()
            .with_listing("root", vec![file("empty.toml", "rules/empty.toml", "f-e")])
            .with_content("f-e", "   \n\t\n");

        let outcome = collect_rules(&repo, &test_config("root")).await;

        assert!(outcome.records.is_empty());
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::FetchFailed {
                file: "empty.toml".to_string(),
                detail: "content is empty".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_parse_failure_carries_content() {
        let repo = MockRepo::default()
            .with_listing("root", vec![file("bad.toml", "rules/bad.toml", "f-bad")])
            .with_content("f-bad", "this is [not toml");

        let outcome = collect_rules(&repo, &test_config("root")).await;

        assert!(outcome.records.is_empty());
        match &outcome.diagnostics[0] {
            Diagnostic::ParseFailed { file, content, .. } => {
                assert_eq!(file, "bad.toml");
                assert_eq!(content, "this is [not toml");
            }
            other => panic!("expected ParseFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_walk_and_export() {
        use chrono::NaiveDate;

        let repo = MockRepo::default()
            .with_listing(
                "root",
                vec![
                    file("a.toml", "rules/windows/a.toml", "f-a"),
                    file("notes.md", "rules/windows/notes.md", "f-md"),
                    file("b.toml", "rules/windows/b.toml", "f-b"),
                ],
            )
            .with_content("f-a", &toml_rule("Rule A"))
            .with_content("f-b", &toml_rule("Rule B"));

        let config = test_config("root");
        let outcome = collect_rules(&repo, &config).await;
        assert_eq!(outcome.records.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let path = crate::export::write_csv(&config, &outcome.records, dir.path(), date)
            .unwrap()
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        assert_eq!(reader.headers().unwrap().len(), 25);
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn test_folder_location_strips_after_marker() {
        let location = folder_location(
            "rules/windows/rules/process_creation/foo.toml",
            Some("/rules/"),
        );
        assert_eq!(location, "process_creation");
    }

    #[test]
    fn test_folder_location_without_marker_occurrence() {
        let location = folder_location("integrations/aws/foo.toml", Some("/rules/"));
        assert_eq!(location, "integrations/aws");
    }

    #[test]
    fn test_folder_location_no_marker_configured() {
        let location = folder_location("rules/windows/driver_load/foo.yml", None);
        assert_eq!(location, "rules/windows/driver_load");
    }

    #[test]
    fn test_folder_location_top_level_file() {
        assert_eq!(folder_location("foo.toml", None), "");
    }
}
