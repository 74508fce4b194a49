// ABOUTME: Pure normalization and naming functions shared by extraction and
// ABOUTME: verification. All functions here are total and idempotent.
use once_cell::sync::Lazy;
use regex::Regex;

static PARAM_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r":(\w+)").unwrap());

/// Canonical route name: lowercased method, `_`, path with every run of
/// non-alphanumeric characters collapsed to a single underscore.
/// An empty remainder falls back to `root`.
pub fn route_name(method: &str, path: &str) -> String {
    let mut cleaned = String::with_capacity(path.len());
    let mut pending_separator = false;
    for c in path.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !cleaned.is_empty() {
                cleaned.push('_');
            }
            pending_separator = false;
            cleaned.push(c);
        } else {
            pending_separator = true;
        }
    }
    if cleaned.is_empty() {
        cleaned.push_str("root");
    }
    format!("{}_{}", method.to_lowercase(), cleaned)
}

/// Canonical service name for a scanned file: PascalCase of the hyphen-split
/// file stem, suffixed with `Service`. An empty stem becomes `RoutesService`.
pub fn service_name(stem: &str) -> String {
    let base: String = stem
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect();
    if base.is_empty() {
        "RoutesService".to_string()
    } else {
        format!("{}Service", base)
    }
}

/// Normalize a route path for spec/implementation matching: every colon
/// parameter token `:name` becomes the placeholder `{name}`, and one
/// trailing slash is stripped unless the path is exactly `/`.
pub fn normalize_route_path(path: &str) -> String {
    let replaced = PARAM_TOKEN.replace_all(path, "{$1}");
    let mut normalized = replaced.into_owned();
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}
