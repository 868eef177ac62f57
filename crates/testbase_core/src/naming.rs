//! Test-name and import-path derivation for generated script tests.
//!
//! All helpers operate on the *relative* script path as written into the generated file, which always uses `/`
//! as its separator regardless of the platform the generator ran on.

use crate::markers::{COMMENT_MARKER, LIST_CLOSE, LIST_OPEN, SCRIPT_EXTENSION};

/// Join path components with `/`.
///
/// ## Examples
/// ```rust
/// use testbase_core::naming::relative_script_path;
///
/// assert_eq!(relative_script_path(["examples", "sub", "a.py"]), "examples/sub/a.py");
/// ```
pub fn relative_script_path<'a>(components: impl IntoIterator<Item = &'a str>) -> String {
    components.into_iter().collect::<Vec<_>>().join("/")
}

/// Rewrite backslash separators to forward slashes.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Drop a trailing script extension, if present.
pub fn strip_script_extension(path: &str) -> &str {
    path.strip_suffix(SCRIPT_EXTENSION).unwrap_or(path)
}

/// Derive the base test-method name for a script (without the `test_` prefix).
///
/// Separators and hyphens become underscores.
///
/// ## Examples
/// ```rust
/// use testbase_core::naming::test_method_name;
///
/// assert_eq!(test_method_name("examples/synfire-chain.py"), "examples_synfire_chain");
/// assert_eq!(test_method_name("examples\\a.py"), "examples_a");
/// ```
pub fn test_method_name(relative_path: &str) -> String {
    strip_script_extension(relative_path)
        .chars()
        .map(|c| match c {
            '/' | '\\' | '-' => '_',
            other => other,
        })
        .collect()
}

/// Derive the dotted module path used to import a script's run-hook.
pub fn module_import_path(relative_path: &str) -> String {
    normalize_separators(strip_script_extension(relative_path)).replace('/', ".")
}

/// Extract a binaries list from the accumulated text of a binaries comment block.
///
/// All whitespace and comment markers are removed, the text between the first `[` and the following `]` is split
/// on commas, and surrounding quotes are stripped from each entry. Empty entries are dropped, so `[]` yields an
/// empty list.
///
/// ## Examples
/// ```rust
/// use testbase_core::naming::extract_binaries;
///
/// let text = "# combined binaries\n# [ \"aplx1\",\n#   \"aplx2\" ]\n";
/// assert_eq!(extract_binaries(text), vec!["aplx1", "aplx2"]);
/// ```
pub fn extract_binaries(text: &str) -> Vec<String> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != COMMENT_MARKER)
        .collect();
    let start = compact.find(LIST_OPEN).map_or(0, |i| i + LIST_OPEN.len_utf8());
    let rest = &compact[start..];
    let inner = match rest.find(LIST_CLOSE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    inner
        .split(',')
        .map(|entry| entry.trim_matches(|c| c == '"' || c == '\''))
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
