// ABOUTME: Tree-sitter route extraction for the two Python declarative idioms:
// ABOUTME: verb-named decorators (FastAPI) and route decorators with a methods
// ABOUTME: keyword (Flask). Both share one AST collector.
use archproof_core::{normalize, Framework, Route};
use std::collections::HashSet;
use tree_sitter::{Node, Parser, Tree, TreeCursor};

use super::Extraction;

const HTTP_VERBS: &[&str] = &["get", "post", "put", "delete", "patch", "options", "head"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonIdiom {
    FastApi,
    Flask,
}

impl PythonIdiom {
    pub fn framework(&self) -> Framework {
        match self {
            PythonIdiom::FastApi => Framework::FastApi,
            PythonIdiom::Flask => Framework::Flask,
        }
    }
}

/// Outcome of running both Python extractors over a file whose idiom could
/// not be determined from imports or keywords.
#[derive(Debug)]
pub enum UnknownIdiomOutcome {
    /// Exactly one extractor produced routes; adopt it and its label.
    Single(PythonIdiom, Extraction),
    /// Both produced routes; the concatenation is labeled Mixed.
    Mixed(Extraction),
    /// Neither produced routes; the port may still have been detected.
    Neither { port: Option<u16> },
}

pub struct PythonRouteExtractor;

impl PythonRouteExtractor {
    pub fn parse(content: &str) -> Option<Tree> {
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&language).ok()?;
        parser.parse(content, None)
    }

    pub fn extract(idiom: PythonIdiom, tree: &Tree, content: &str) -> Extraction {
        let mut collector = PythonCollector::new(idiom, content);
        let mut cursor = tree.walk();
        collector.walk(&mut cursor);
        collector.into_extraction()
    }

    /// Ambiguous-idiom path: run both extractors and resolve deterministically.
    pub fn extract_unknown(tree: &Tree, content: &str) -> UnknownIdiomOutcome {
        let flask = Self::extract(PythonIdiom::Flask, tree, content);
        let fastapi = Self::extract(PythonIdiom::FastApi, tree, content);

        match (flask.routes.is_empty(), fastapi.routes.is_empty()) {
            (false, true) => UnknownIdiomOutcome::Single(PythonIdiom::Flask, flask),
            (true, false) => UnknownIdiomOutcome::Single(PythonIdiom::FastApi, fastapi),
            (false, false) => UnknownIdiomOutcome::Mixed(flask.merge(fastapi)),
            (true, true) => UnknownIdiomOutcome::Neither {
                port: flask.port.or(fastapi.port),
            },
        }
    }
}

struct PythonCollector<'a> {
    idiom: PythonIdiom,
    content: &'a str,
    app_bindings: HashSet<String>,
    routes: Vec<Route>,
    port: Option<u16>,
}

impl<'a> PythonCollector<'a> {
    fn new(idiom: PythonIdiom, content: &'a str) -> Self {
        let app_bindings: HashSet<String> = match idiom {
            PythonIdiom::FastApi => vec!["app", "router", "api"],
            PythonIdiom::Flask => vec!["app"],
        }
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            idiom,
            content,
            app_bindings,
            routes: Vec::new(),
            port: None,
        }
    }

    fn into_extraction(self) -> Extraction {
        Extraction {
            routes: self.routes,
            port: self.port,
        }
    }

    fn walk(&mut self, cursor: &mut TreeCursor) {
        let node = cursor.node();

        match node.kind() {
            "assignment" => self.record_app_binding(&node),
            "decorated_definition" => self.process_decorated_definition(&node),
            "call" => self.record_declared_port(&node),
            _ => {}
        }

        if cursor.goto_first_child() {
            loop {
                self.walk(cursor);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    }

    /// Grow the app-like binding set on `name = Constructor(...)` assignments.
    fn record_app_binding(&mut self, node: &Node) {
        let Some(right) = node.child_by_field_name("right") else {
            return;
        };
        if right.kind() != "call" {
            return;
        }
        let Some(func) = right.child_by_field_name("function") else {
            return;
        };
        if func.kind() != "identifier" {
            return;
        }

        let constructor = self.node_text(&func);
        let is_app_constructor = match self.idiom {
            PythonIdiom::FastApi => matches!(
                constructor.to_lowercase().as_str(),
                "fastapi" | "fastapiclient" | "fastapirouter" | "apirouter" | "fastapiapp"
                    | "fastapiapplication"
            ),
            PythonIdiom::Flask => constructor == "Flask" || constructor == "Blueprint",
        };
        if !is_app_constructor {
            return;
        }

        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        match left.kind() {
            "identifier" => {
                let name = self.node_text(&left).to_string();
                self.app_bindings.insert(name);
            }
            "pattern_list" | "tuple_pattern" => {
                let mut cursor = left.walk();
                for child in left.named_children(&mut cursor) {
                    if child.kind() == "identifier" {
                        let name = self.node_text(&child).to_string();
                        self.app_bindings.insert(name);
                    }
                }
            }
            _ => {}
        }
    }

    /// Scan a decorated function definition: route decorators yield candidate
    /// routes, every other decorator contributes a middleware name that
    /// applies to all routes found on the same definition.
    fn process_decorated_definition(&mut self, node: &Node) {
        let Some(definition) = node.child_by_field_name("definition") else {
            return;
        };
        if definition.kind() != "function_definition" {
            return;
        }
        let Some(name_node) = definition.child_by_field_name("name") else {
            return;
        };
        let handler = self.node_text(&name_node).to_string();

        let mut middleware: Vec<String> = Vec::new();
        let mut found: Vec<(String, String)> = Vec::new();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "decorator" {
                continue;
            }
            let Some(expr) = child.named_child(0) else {
                continue;
            };
            match expr.kind() {
                "call" => self.process_decorator_call(&expr, &mut middleware, &mut found),
                "attribute" => {
                    if let Some(attr) = expr.child_by_field_name("attribute") {
                        middleware.push(self.node_text(&attr).to_string());
                    }
                }
                "identifier" => middleware.push(self.node_text(&expr).to_string()),
                _ => {}
            }
        }

        for (method, path) in found {
            self.routes.push(Route {
                name: normalize::route_name(&method, &path),
                method,
                path,
                middleware: middleware.clone(),
                handler: handler.clone(),
                framework: self.idiom.framework(),
            });
        }
    }

    fn process_decorator_call(
        &self,
        call: &Node,
        middleware: &mut Vec<String>,
        found: &mut Vec<(String, String)>,
    ) {
        let Some(func) = call.child_by_field_name("function") else {
            return;
        };
        match func.kind() {
            "attribute" => {
                let object = func.child_by_field_name("object");
                let attribute = func.child_by_field_name("attribute");
                let (Some(object), Some(attribute)) = (object, attribute) else {
                    return;
                };
                let attr_name = self.node_text(&attribute).to_string();

                let receiver_is_app = object.kind() == "identifier"
                    && self.app_bindings.contains(self.node_text(&object));

                match self.idiom {
                    PythonIdiom::FastApi
                        if receiver_is_app
                            && HTTP_VERBS.contains(&attr_name.to_lowercase().as_str()) =>
                    {
                        let path = self.first_positional_string(call).unwrap_or_default();
                        found.push((attr_name.to_uppercase(), path));
                    }
                    PythonIdiom::Flask if receiver_is_app && attr_name == "route" => {
                        let path = self.first_positional_string(call).unwrap_or_default();
                        for method in self.route_methods(call) {
                            found.push((method, path.clone()));
                        }
                    }
                    _ => middleware.push(attr_name),
                }
            }
            "identifier" => middleware.push(self.node_text(&func).to_string()),
            _ => {}
        }
    }

    /// First non-keyword argument, if it is a plain string literal.
    fn first_positional_string(&self, call: &Node) -> Option<String> {
        let arguments = call.child_by_field_name("arguments")?;
        let mut cursor = arguments.walk();
        for arg in arguments.named_children(&mut cursor) {
            if arg.kind() == "keyword_argument" {
                continue;
            }
            return self.string_literal(&arg);
        }
        None
    }

    /// Methods listed in a `methods=[...]` keyword; defaults to GET.
    fn route_methods(&self, call: &Node) -> Vec<String> {
        let Some(arguments) = call.child_by_field_name("arguments") else {
            return vec!["GET".to_string()];
        };
        let mut cursor = arguments.walk();
        for arg in arguments.named_children(&mut cursor) {
            if arg.kind() != "keyword_argument" {
                continue;
            }
            let Some(name) = arg.child_by_field_name("name") else {
                continue;
            };
            if self.node_text(&name) != "methods" {
                continue;
            }
            let Some(value) = arg.child_by_field_name("value") else {
                continue;
            };
            if !matches!(value.kind(), "list" | "tuple" | "set") {
                continue;
            }
            let mut inner = value.walk();
            return value
                .named_children(&mut inner)
                .filter_map(|elt| self.string_literal(&elt))
                .map(|m| m.to_uppercase())
                .collect();
        }
        vec!["GET".to_string()]
    }

    /// Detect the server-start call carrying a `port` keyword argument.
    fn record_declared_port(&mut self, node: &Node) {
        let Some(func) = node.child_by_field_name("function") else {
            return;
        };
        if func.kind() != "attribute" {
            return;
        }
        let object = func.child_by_field_name("object");
        let attribute = func.child_by_field_name("attribute");
        let (Some(object), Some(attribute)) = (object, attribute) else {
            return;
        };
        if object.kind() != "identifier" {
            return;
        }

        let receiver = self.node_text(&object);
        let is_server_start = match self.idiom {
            PythonIdiom::FastApi => receiver == "uvicorn" && self.node_text(&attribute) == "run",
            PythonIdiom::Flask => {
                self.app_bindings.contains(receiver) && self.node_text(&attribute) == "run"
            }
        };
        if !is_server_start {
            return;
        }

        let Some(arguments) = node.child_by_field_name("arguments") else {
            return;
        };
        let mut cursor = arguments.walk();
        for arg in arguments.named_children(&mut cursor) {
            if arg.kind() != "keyword_argument" {
                continue;
            }
            let Some(name) = arg.child_by_field_name("name") else {
                continue;
            };
            if self.node_text(&name) != "port" {
                continue;
            }
            if let Some(value) = arg.child_by_field_name("value") {
                if value.kind() == "integer" {
                    if let Ok(port) = self.node_text(&value).parse::<u16>() {
                        self.port = Some(port);
                    }
                }
            }
        }
    }

    fn string_literal(&self, node: &Node) -> Option<String> {
        if node.kind() != "string" {
            return None;
        }
        let mut text = String::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "string_content" {
                text.push_str(self.node_text(&child));
            }
        }
        Some(text)
    }

    fn node_text(&self, node: &Node) -> &str {
        node.utf8_text(self.content.as_bytes()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(idiom: PythonIdiom, source: &str) -> Extraction {
        let tree = PythonRouteExtractor::parse(source).unwrap();
        PythonRouteExtractor::extract(idiom, &tree, source)
    }

    #[test]
    fn fastapi_verb_decorators_with_middleware() {
        let src = r#"
from fastapi import FastAPI
import uvicorn

app = FastAPI()

@app.get("/users")
async def list_users():
    return []

@requires_admin
@app.post("/users")
async def create_user(user: dict):
    return user

if __name__ == "__main__":
    uvicorn.run(app, port=8000)
"#;
        let extraction = extract(PythonIdiom::FastApi, src);
        assert_eq!(extraction.routes.len(), 2);

        let get = &extraction.routes[0];
        assert_eq!(get.method, "GET");
        assert_eq!(get.path, "/users");
        assert_eq!(get.handler, "list_users");
        assert!(get.middleware.is_empty());

        let post = &extraction.routes[1];
        assert_eq!(post.method, "POST");
        assert_eq!(post.middleware, vec!["requires_admin"]);

        assert_eq!(extraction.port, Some(8000));
    }

    #[test]
    fn fastapi_router_binding_is_recognized() {
        let src = r#"
from fastapi import APIRouter

orders = APIRouter()

@orders.get("/orders/{order_id}")
async def get_order(order_id: int):
    return {}
"#;
        let extraction = extract(PythonIdiom::FastApi, src);
        assert_eq!(extraction.routes.len(), 1);
        assert_eq!(extraction.routes[0].path, "/orders/{order_id}");
    }

    #[test]
    fn flask_route_decorator_expands_methods_keyword() {
        let src = r#"
from flask import Flask

app = Flask(__name__)

@app.route("/items", methods=["GET", "POST"])
def items():
    return []

@login_required
@app.route("/admin")
def admin_panel():
    return ""

app.run(port=5000)
"#;
        let extraction = extract(PythonIdiom::Flask, src);
        let methods: Vec<_> = extraction.routes.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(methods, vec!["GET", "POST", "GET"]);
        assert_eq!(extraction.routes[2].middleware, vec!["login_required"]);
        assert_eq!(extraction.port, Some(5000));
    }

    #[test]
    fn flask_blueprint_binding_is_recognized() {
        let src = r#"
from flask import Blueprint

admin_bp = Blueprint("admin", __name__)

@admin_bp.route("/admin/users", methods=["DELETE"])
def remove_user():
    pass
"#;
        let extraction = extract(PythonIdiom::Flask, src);
        assert_eq!(extraction.routes.len(), 1);
        assert_eq!(extraction.routes[0].method, "DELETE");
        assert_eq!(extraction.routes[0].handler, "remove_user");
    }

    #[test]
    fn non_literal_path_argument_yields_empty_path() {
        let src = r#"
app = FastAPI()

@app.get(PREFIX + "/users")
def list_users():
    return []
"#;
        let extraction = extract(PythonIdiom::FastApi, src);
        assert_eq!(extraction.routes.len(), 1);
        assert_eq!(extraction.routes[0].path, "");
        assert_eq!(extraction.routes[0].name, "get_root");
    }

    #[test]
    fn unknown_idiom_resolution_adopts_the_single_producer() {
        let src = r#"
app = Flask(__name__)

@app.route("/ping")
def ping():
    return "pong"
"#;
        let tree = PythonRouteExtractor::parse(src).unwrap();
        match PythonRouteExtractor::extract_unknown(&tree, src) {
            UnknownIdiomOutcome::Single(PythonIdiom::Flask, extraction) => {
                assert_eq!(extraction.routes.len(), 1);
            }
            other => panic!("expected Flask adoption, got {:?}", other),
        }
    }

    #[test]
    fn unknown_idiom_with_no_routes_reports_neither() {
        let src = "x = 1\n";
        let tree = PythonRouteExtractor::parse(src).unwrap();
        assert!(matches!(
            PythonRouteExtractor::extract_unknown(&tree, src),
            UnknownIdiomOutcome::Neither { port: None }
        ));
    }
}
