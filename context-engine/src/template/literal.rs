//! `$NAME` placeholder substitution
//!
//! Substitution is a single left-to-right pass. At each `$` the longest
//! known name that matches wins (ties broken lexicographically), so
//! `$GITHUB_ISSUE_NUMBER` is never consumed as `$GITHUB_ISSUE`. Substituted
//! values are not re-scanned, and unknown tokens are copied verbatim.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Anything shaped like a placeholder.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Z][A-Z0-9_]*)").expect("PLACEHOLDER_RE regex should compile")
});

/// Names in substitution priority order: longer first, then lexicographic.
pub fn substitution_order<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut names: Vec<&str> = names.into_iter().filter(|n| !n.is_empty()).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names.dedup();
    names
}

/// Replace every `$NAME` in `template` whose name is a key of `vars`.
pub fn substitute(template: &str, vars: &BTreeMap<String, String>) -> String {
    if !template.contains('$') || vars.is_empty() {
        return template.to_string();
    }
    let order = substitution_order(vars.keys().map(String::as_str));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match order.iter().find(|name| after.starts_with(**name)) {
            Some(name) => {
                out.push_str(&vars[*name]);
                rest = &after[name.len()..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Distinct placeholder-shaped tokens in `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut seen = Vec::new();
    for cap in PLACEHOLDER_RE.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            if !seen.contains(&m.as_str()) {
                seen.push(m.as_str());
            }
        }
    }
    seen
}

/// Whether `text` contains a `$GITHUB_*` token.
pub fn has_github_placeholder(text: &str) -> bool {
    placeholders(text).iter().any(|p| p.starts_with("GITHUB_"))
}
