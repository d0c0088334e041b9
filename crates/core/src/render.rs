//! `{{variable}}` template rendering and variable extraction.
//!
//! Action templates carry free-text fields (subjects, bodies, URLs) with
//! `{{name}}` tokens that are substituted at dispatch time from a string
//! map. The same functions drive the preview UI, which extracts the token
//! names first and asks the operator for sample values.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Regex pattern matching `{{variable}}` tokens in template strings.
///
/// Non-greedy between the braces; nested or escaped braces are not supported.
pub const VARIABLE_PATTERN: &str = r"\{\{(.+?)\}\}";

/// Compiled regex for `{{variable}}` tokens. Compiled once, reused forever.
static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VARIABLE_PATTERN).expect("valid regex"));

/// Variable name → value map used for rendering.
pub type VariableMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a template string by substituting `{{name}}` tokens from `values`.
///
/// Matching is case-sensitive. A token whose name is absent from `values`
/// is left verbatim, braces included. A token whose value is the empty
/// string is also left verbatim: an empty value behaves like a missing key,
/// and downstream consumers rely on unfilled tokens surviving the render,
/// so the quirk is load-bearing and kept for compatibility.
pub fn render_template(template: &str, values: &VariableMap) -> String {
    if template.is_empty() {
        return String::new();
    }

    VARIABLE_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match values.get(name) {
                Some(value) if !value.is_empty() => value.clone(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Variable extraction
// ---------------------------------------------------------------------------

/// Extract the deduplicated set of `{{variable}}` names across one or more
/// template strings.
///
/// The result is a sorted set; encounter order and duplicates across inputs
/// do not affect it.
pub fn extract_variables<S: AsRef<str>>(templates: &[S]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for template in templates {
        for caps in VARIABLE_RE.captures_iter(template.as_ref()) {
            names.insert(caps[1].to_string());
        }
    }
    names
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
