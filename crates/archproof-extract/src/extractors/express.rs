use archproof_core::{normalize, Framework, Route};
use once_cell::sync::Lazy;
use regex::Regex;

use super::Extraction;

// Registration shape: <receiver>.<verb>('<path>', <middleware...,> <handler>);
static ROUTE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?si)(?:(?:const|let|var)\s+\w+\s*=\s*)?(app|router)\.(get|post|put|delete|patch|options|head)\s*\(\s*(['"`][^'"`]*['"`])\s*,\s*(.*?)\)\s*;"#,
    )
    .unwrap()
});

// First function-literal marker inside the registration arguments. Everything
// before it is middleware, everything from it on is the handler expression.
static HANDLER_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:async\s+)?function\s*\(|\([^)]*\)\s*=>|\w+\s*=>").unwrap());

static LISTEN_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.listen\s*\(\s*(\d+)\s*[,)]").unwrap());

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//.*").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Lexical route extractor for the Express-style JS/TS grammar family.
pub struct ExpressExtractor;

impl ExpressExtractor {
    pub fn extract(content: &str) -> Extraction {
        let clean = strip_comments(content);

        let mut routes = Vec::new();
        for captures in ROUTE_CALL.captures_iter(&clean) {
            let method = captures[2].to_uppercase();
            let path = captures[3]
                .trim_matches(|c| c == '\'' || c == '"' || c == '`')
                .to_string();
            let (middleware, handler) = split_middleware_and_handler(&captures[4]);
            routes.push(Route {
                name: normalize::route_name(&method, &path),
                method,
                path,
                middleware,
                handler,
                framework: Framework::Express,
            });
        }

        let port = LISTEN_CALL
            .captures(&clean)
            .and_then(|c| c[1].parse::<u16>().ok());

        Extraction { routes, port }
    }
}

fn strip_comments(content: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(content, "");
    BLOCK_COMMENT.replace_all(&without_lines, "").into_owned()
}

fn split_middleware_and_handler(rest: &str) -> (Vec<String>, String) {
    let rest = rest.trim();
    match HANDLER_START.find(rest) {
        Some(m) => {
            let middleware = rest[..m.start()]
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            let handler = rest[m.start()..].split_whitespace().collect::<Vec<_>>().join(" ");
            (middleware, handler)
        }
        None => {
            // No function literal: comma-split and treat the last piece as
            // a named handler reference.
            let mut parts: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            match parts.pop() {
                Some(handler) => (parts, handler),
                None => (Vec::new(), String::new()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_route_with_inline_middleware_and_arrow_handler() {
        let src = r#"
const express = require('express');
const app = express();

app.post('/orders', authenticate, validateOrder, (req, res) => {
    res.json({ ok: true });
});

app.listen(3000);
"#;
        let extraction = ExpressExtractor::extract(src);
        assert_eq!(extraction.routes.len(), 1);
        let route = &extraction.routes[0];
        assert_eq!(route.method, "POST");
        assert_eq!(route.path, "/orders");
        assert_eq!(route.middleware, vec!["authenticate", "validateOrder"]);
        assert!(route.handler.starts_with("(req, res) =>"));
        assert_eq!(extraction.port, Some(3000));
    }

    #[test]
    fn extracts_named_handler_reference_without_function_literal() {
        let src = "app.get('/users', listUsers);";
        let extraction = ExpressExtractor::extract(src);
        assert_eq!(extraction.routes.len(), 1);
        assert!(extraction.routes[0].middleware.is_empty());
        assert_eq!(extraction.routes[0].handler, "listUsers");
    }

    #[test]
    fn commented_out_routes_are_ignored() {
        let src = r#"
// app.delete('/users/:id', removeUser);
/* app.put('/users/:id', updateUser); */
app.get('/users', function (req, res) { res.send([]); });
"#;
        let extraction = ExpressExtractor::extract(src);
        assert_eq!(extraction.routes.len(), 1);
        assert_eq!(extraction.routes[0].method, "GET");
    }

    #[test]
    fn router_receiver_and_listen_with_callback() {
        let src = r#"
router.put('/items/:id', checkJwt, async function (req, res) { res.end(); });
server.listen(8081, () => console.log('up'));
"#;
        let extraction = ExpressExtractor::extract(src);
        assert_eq!(extraction.routes.len(), 1);
        assert_eq!(extraction.routes[0].middleware, vec!["checkJwt"]);
        assert_eq!(extraction.port, Some(8081));
    }

    #[test]
    fn route_names_follow_canonical_form() {
        let src = "app.get('/api/v1/users', h);";
        let extraction = ExpressExtractor::extract(src);
        assert_eq!(extraction.routes[0].name, "get_api_v1_users");
    }
}
