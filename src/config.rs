// src/config.rs
// =============================================================================
// This file defines the export pipeline configuration.
//
// Everything that differs between rule sources lives here: the repository
// listing URL, the file format, which dotted field paths to pull out of each
// rule, which files to skip, how missing fields are recorded, and how the
// output file is named. The pipeline itself is one shared code path driven
// entirely by this struct.
//
// Two presets are built in:
// - elastic: TOML rules from elastic/detection-rules
// - sigma:   YAML rules from SigmaHQ/sigma
// =============================================================================

// Synthetic columns present in every record, regardless of source
pub const FOLDER_COLUMN: &str = "GitHub Folder Location";
pub const FILE_COLUMN: &str = "GitHub File Name";

// Default listing URLs for the two supported rule repositories
pub const ELASTIC_RULES_URL: &str =
    "https://api.github.com/repos/elastic/detection-rules/contents/rules";
pub const SIGMA_RULES_URL: &str =
    "https://api.github.com/repos/SigmaHQ/sigma/contents/rules";

// Sigma ships a handful of huge list-only rule files that break the export;
// they are skipped without even fetching their content
const SIGMA_EXCLUDED_FILES: &[&str] = &[
    "driver_load_win_mal_drivers.yml",
    "driver_load_win_mal_drivers_names.yml",
    "driver_load_win_vuln_drivers.yml",
    "driver_load_win_vuln_drivers_names.yml",
];

// The dotted paths extracted from every Elastic rule file
const ELASTIC_FIELDS: &[&str] = &[
    "metadata.creation_date",
    "metadata.integration",
    "metadata.maturity",
    "metadata.min_stack_comments",
    "metadata.min_stack_version",
    "metadata.updated_date",
    "rule.author",
    "rule.description",
    "rule.false_positives",
    "rule.from",
    "rule.index",
    "rule.language",
    "rule.license",
    "rule.name",
    "rule.note",
    "rule.references",
    "rule.risk_score",
    "rule.rule_id",
    "rule.severity",
    "rule.tags",
    "rule.timestamp_override",
    "rule.type",
    "rule.query",
];

// Which parser decodes a fetched rule file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Toml,
    Yaml,
}

// What goes into a record when a field path does not resolve
//
// The Elastic export keeps a real null so downstream consumers can tell
// "field missing" apart from "field present but empty"; the Sigma export
// stores empty strings so every column stays uniformly string-typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValue {
    /// Record the absent marker (renders as an empty CSV cell)
    Null,
    /// Record an actual empty string
    Empty,
}

// How a file's raw text is retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// GET the entry's API URL; the body is a JSON envelope with
    /// base64-encoded content
    ApiEnvelope,
    /// GET the entry's download URL; the body is the raw text
    RawDownload,
}

// One field to extract: the dotted path into the parsed document and the
// CSV column name it lands under
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Dotted traversal path, e.g. "metadata.creation_date" or "logsource.product"
    pub path: String,
    /// Output column header
    pub column: String,
}

impl FieldSpec {
    // For sources where the column is just the dotted path itself
    fn dotted(path: &str) -> Self {
        Self {
            path: path.to_string(),
            column: path.to_string(),
        }
    }

    // For sources that rename keys into fixed column headers
    fn named(path: &str, column: &str) -> Self {
        Self {
            path: path.to_string(),
            column: column.to_string(),
        }
    }
}

// Full configuration for one export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// GitHub contents API URL of the directory the walk starts from
    pub root_url: String,
    /// Parser used for fetched rule files
    pub format: RuleFormat,
    /// File name suffix that marks a rule file (".toml" / ".yml")
    pub extension: String,
    /// Fields extracted from each parsed rule
    pub fields: Vec<FieldSpec>,
    /// Columns promoted to the front of the CSV, right after the synthetic ones
    pub identity_columns: Vec<String>,
    /// File names skipped without a fetch attempt
    pub excluded_files: Vec<String>,
    /// Path segment marker; the folder location keeps only what follows it
    pub folder_marker: Option<String>,
    /// Policy for fields that fail to resolve
    pub missing_value: MissingValue,
    /// How file content is retrieved
    pub fetch_mode: FetchMode,
    /// Output file name prefix; the dated suffix and .csv are appended
    pub output_prefix: String,
}

impl ExportConfig {
    // Preset for the Elastic detection-rules repository (TOML rules)
    pub fn elastic() -> Self {
        Self {
            root_url: ELASTIC_RULES_URL.to_string(),
            format: RuleFormat::Toml,
            extension: ".toml".to_string(),
            fields: ELASTIC_FIELDS.iter().map(|path| FieldSpec::dotted(path)).collect(),
            identity_columns: vec!["rule.name".to_string(), "rule.rule_id".to_string()],
            excluded_files: Vec::new(),
            folder_marker: Some("/rules/".to_string()),
            missing_value: MissingValue::Null,
            fetch_mode: FetchMode::ApiEnvelope,
            output_prefix: "elastic_detection_rules_export".to_string(),
        }
    }

    // Preset for the SigmaHQ sigma repository (YAML rules)
    pub fn sigma() -> Self {
        Self {
            root_url: SIGMA_RULES_URL.to_string(),
            format: RuleFormat::Yaml,
            extension: ".yml".to_string(),
            fields: vec![
                FieldSpec::named("title", "Title"),
                FieldSpec::named("id", "ID"),
                FieldSpec::named("status", "Status"),
                FieldSpec::named("description", "Description"),
                FieldSpec::named("date", "Date"),
                FieldSpec::named("modified", "Modified"),
                FieldSpec::named("tags", "Tags"),
                FieldSpec::named("logsource.product", "Product"),
                FieldSpec::named("logsource.category", "Category"),
                FieldSpec::named("author", "Author"),
                FieldSpec::named("detection", "Detection"),
                FieldSpec::named("falsepositives", "Falsepositives"),
                FieldSpec::named("level", "Level"),
            ],
            identity_columns: Vec::new(),
            excluded_files: SIGMA_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect(),
            folder_marker: None,
            missing_value: MissingValue::Empty,
            fetch_mode: FetchMode::RawDownload,
            output_prefix: "sigma_rules_export".to_string(),
        }
    }
}
