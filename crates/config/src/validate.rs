//! Configuration validation engine.
//!
//! Checks a config file against the known schema, flags unknown or
//! misspelled fields, and reports catalog and integration problems that
//! would otherwise only surface once a wizard is running.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use crate::{
    env_subst::substitute_env,
    schema::{PorchConfig, is_placeholder},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "catalog",
    /// "integration", "countdown", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "pricing.add_ons[1].id"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Array(Box<KnownKeys>),
    Leaf,
}

/// Mirror of every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    let tier = Struct(HashMap::from([("name", Leaf), ("price", Leaf)]));
    let add_on = Struct(HashMap::from([
        ("id", Leaf),
        ("name", Leaf),
        ("price", Leaf),
        ("description", Leaf),
    ]));

    Struct(HashMap::from([
        (
            "pricing",
            Struct(HashMap::from([
                ("tiers", Array(Box::new(tier))),
                ("add_ons", Array(Box::new(add_on))),
            ])),
        ),
        (
            "submission",
            Struct(HashMap::from([
                ("delay_ms", Leaf),
                ("webhook_url", Leaf),
                ("checkout_url", Leaf),
            ])),
        ),
        ("countdown", Struct(HashMap::from([("target", Leaf)]))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Levenshtein edit distance between two strings, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let ext = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml");

    let mut result = match std::fs::read_to_string(actual_path) {
        Ok(content) => validate_str(&content, ext),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path.clone());
    result
}

/// Validate a TOML string without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    validate_str(toml_str, "toml")
}

/// Validate raw config text in the format named by `ext`.
///
/// `${VAR}` placeholders are substituted first, as the loader does.
#[must_use]
pub fn validate_str(raw: &str, ext: &str) -> ValidationResult {
    validate_substituted(&substitute_env(raw), ext)
}

fn validate_substituted(raw: &str, ext: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax, normalised to a TOML tree for the schema walk
    let tree = match parse_tree(raw, ext) {
        Ok(tree) => tree,
        Err(message) => {
            diagnostics.push(Diagnostic::new(Severity::Error, "syntax", "", message));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&tree, &build_schema_map(), "", &mut diagnostics);

    // 3. Types, then semantic checks on what parsed
    match tree.try_into::<PorchConfig>() {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn parse_tree(raw: &str, ext: &str) -> Result<toml::Value, String> {
    match ext {
        "toml" => toml::from_str(raw).map_err(|e| format!("TOML syntax error: {e}")),
        "yaml" | "yml" => serde_yaml::from_str::<serde_json::Value>(raw)
            .map_err(|e| format!("YAML syntax error: {e}"))
            .and_then(json_to_toml),
        "json" => serde_json::from_str::<serde_json::Value>(raw)
            .map_err(|e| format!("JSON syntax error: {e}"))
            .and_then(json_to_toml),
        other => Err(format!("unsupported config format: .{other}")),
    }
}

fn json_to_toml(value: serde_json::Value) -> Result<toml::Value, String> {
    toml::Value::try_from(value).map_err(|e| format!("unrepresentable value: {e}"))
}

/// Walk the value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (toml::Value::Table(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                    continue;
                }
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "unknown-field",
                    path,
                    message,
                ));
            }
        },
        (toml::Value::Array(arr), KnownKeys::Array(item_schema)) => {
            for (i, item) in arr.iter().enumerate() {
                check_unknown_fields(item, item_schema, &format!("{prefix}[{i}]"), diagnostics);
            }
        },
        // Leaf or type mismatch; type errors are reported later
        _ => {},
    }
}

/// Run catalog, integration and countdown checks on a parsed config.
fn check_semantics(config: &PorchConfig, diagnostics: &mut Vec<Diagnostic>) {
    let pricing = &config.pricing;

    if pricing.tiers.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "catalog",
            "pricing.tiers",
            "no tiers configured; the wizard cannot be opened",
        ));
    }

    let mut seen = HashSet::new();
    for (i, tier) in pricing.tiers.iter().enumerate() {
        let path = format!("pricing.tiers[{i}]");
        if tier.name.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "catalog",
                format!("{path}.name"),
                "tier name is empty",
            ));
        } else if !seen.insert(tier.name.as_str()) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "catalog",
                format!("{path}.name"),
                format!("duplicate tier \"{}\"", tier.name),
            ));
        }
    }

    let mut seen = HashSet::new();
    for (i, add_on) in pricing.add_ons.iter().enumerate() {
        let path = format!("pricing.add_ons[{i}]");
        if add_on.id.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "catalog",
                format!("{path}.id"),
                "add-on id is empty",
            ));
        } else if !seen.insert(add_on.id.as_str()) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "catalog",
                format!("{path}.id"),
                format!("duplicate add-on id \"{}\"", add_on.id),
            ));
        }
        if add_on.price.0 == 0 {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "catalog",
                format!("{path}.price"),
                "add-on price must be greater than zero",
            ));
        }
    }

    let submission = &config.submission;
    for (field, url) in [
        ("webhook_url", submission.webhook_url.as_deref()),
        ("checkout_url", submission.checkout_url.as_deref()),
    ] {
        let Some(url) = url else {
            continue;
        };
        let path = format!("submission.{field}");
        if is_placeholder(url) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "integration",
                path,
                "URL is still a placeholder and will be ignored",
            ));
            continue;
        }
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {},
            Ok(parsed) => diagnostics.push(Diagnostic::new(
                Severity::Error,
                "integration",
                path,
                format!("unsupported URL scheme \"{}\"", parsed.scheme()),
            )),
            Err(e) => diagnostics.push(Diagnostic::new(
                Severity::Error,
                "integration",
                path,
                format!("invalid URL: {e}"),
            )),
        }
    }

    if submission.live_webhook_url().is_none() {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "integration",
            "submission",
            format!(
                "no webhook configured; submissions are simulated with a {} ms delay",
                submission.delay_ms
            ),
        ));
    }

    if let Err(e) = porch_common::countdown::parse_target(&config.countdown.target) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "countdown",
            "countdown.target",
            e.to_string(),
        ));
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
