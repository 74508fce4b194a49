use archproof_core::{normalize, Framework, Route};
use once_cell::sync::Lazy;
use regex::Regex;

use super::Extraction;

// net/http style: the mux decides the method, so it is recorded as ANY.
static HANDLE_FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"http\.HandleFunc\s*\(\s*"([^"]*)"\s*,\s*([A-Za-z0-9_\.]+)\s*\)"#).unwrap()
});

// Router style with upper-case verb methods (gin and friends).
static VERB_UPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([A-Za-z0-9_]+)\.(GET|POST|PUT|DELETE|PATCH|OPTIONS|HEAD)\s*\(\s*"([^"]*)"\s*,\s*([A-Za-z0-9_\.]+)\s*\)"#,
    )
    .unwrap()
});

// Router style with capitalized verb methods (fiber and friends).
static VERB_CAPITALIZED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([A-Za-z0-9_]+)\.(Get|Post|Put|Delete|Patch|Options|Head)\s*\(\s*"([^"]*)"\s*,\s*([A-Za-z0-9_\.]+)\s*\)"#,
    )
    .unwrap()
});

// ListenAndServe(":8080", ...) / ListenAndServe("localhost:8080", ...)
static LISTEN_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"ListenAndServe\s*\(\s*"[^"]*?(\d+)""#).unwrap());
static LISTEN_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ListenAndServe\s*\(\s*:?(\d+)").unwrap());

/// Lexical route extractor for the Go grammar family.
pub struct GoExtractor;

impl GoExtractor {
    pub fn extract(content: &str) -> Extraction {
        let mut routes = Vec::new();

        for captures in HANDLE_FUNC.captures_iter(content) {
            routes.push(make_route("ANY", &captures[1], &captures[2]));
        }
        for captures in VERB_UPPER.captures_iter(content) {
            routes.push(make_route(&captures[2].to_uppercase(), &captures[3], &captures[4]));
        }
        for captures in VERB_CAPITALIZED.captures_iter(content) {
            routes.push(make_route(&captures[2].to_uppercase(), &captures[3], &captures[4]));
        }

        let port = LISTEN_QUOTED
            .captures(content)
            .or_else(|| LISTEN_BARE.captures(content))
            .and_then(|c| c[1].parse::<u16>().ok());

        Extraction { routes, port }
    }
}

fn make_route(method: &str, path: &str, handler: &str) -> Route {
    Route {
        name: normalize::route_name(method, path),
        method: method.to_string(),
        path: path.to_string(),
        middleware: Vec::new(),
        handler: handler.to_string(),
        framework: Framework::Go,
    }
}
