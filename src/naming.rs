//! Name canonicalization helpers.
//!
//! Plugins are addressed by a canonical snake_case identifier, whatever case
//! their author registered them under. Sources are addressed on disk by an id
//! derived from their URL.

use regex::Regex;
use std::sync::LazyLock;

static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static regex"));
static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex"));
static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("static regex"));

/// Fold a plugin name to its canonical identifier.
///
/// `DiffStats`, `diffStats`, `diff-stats` and `diff_stats` all map to
/// `diff_stats`. Acronyms stay grouped: `HTTPServer` becomes `http_server`.
pub fn canonical_name(name: &str) -> String {
    let name = name.trim();
    let name = ACRONYM_BOUNDARY.replace_all(name, "${1}_${2}");
    let name = WORD_BOUNDARY.replace_all(&name, "${1}_${2}");
    name.replace('-', "_").to_lowercase()
}

/// Derive the filesystem-safe id of a source URL.
///
/// Every run of characters outside `[A-Za-z0-9_-]` collapses to one `_`.
pub fn source_id(url: &str) -> String {
    UNSAFE_RUN.replace_all(url, "_").into_owned()
}
