// ABOUTME: Deterministic framework selection: file extension first, then
// ABOUTME: import/keyword inspection for Python content.
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Tree};

use crate::extractors::PythonIdiom;

static FASTAPI_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFastAPI\b").unwrap());
static FLASK_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bflask\b").unwrap());
static FLASK_CONSTRUCTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:Blueprint|Flask)\s*\(").unwrap());

/// Which grammar family handles a file, decided from its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarFamily {
    /// `.js` / `.ts`: Express-style lexical extraction.
    JavaScript,
    /// `.py`: tree parse plus idiom detection.
    Python,
    /// `.go`: Go-style lexical extraction.
    Go,
    /// Anything else: content sniffing only.
    Other,
}

pub fn grammar_family(extension: Option<&str>) -> GrammarFamily {
    match extension {
        Some("js") | Some("ts") => GrammarFamily::JavaScript,
        Some("py") => GrammarFamily::Python,
        Some("go") | Some("golang") => GrammarFamily::Go,
        _ => GrammarFamily::Other,
    }
}

/// Result of inspecting Python content for framework markers.
///
/// `NoMatch` is an explicit outcome: the caller runs both extractors and
/// resolves via [`crate::extractors::UnknownIdiomOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonDetection {
    SingleMatch(PythonIdiom),
    NoMatch,
}

/// Inspect declared imports and literal keyword occurrences. FastAPI markers
/// take precedence over Flask markers when both appear.
pub fn detect_python_idiom(tree: &Tree, content: &str) -> PythonDetection {
    let imports = collect_import_names(tree, content);

    if imports.iter().any(|m| m.contains("fastapi")) || FASTAPI_KEYWORD.is_match(content) {
        return PythonDetection::SingleMatch(PythonIdiom::FastApi);
    }
    if imports.iter().any(|m| m.contains("flask"))
        || FLASK_KEYWORD.is_match(content)
        || FLASK_CONSTRUCTOR.is_match(content)
    {
        return PythonDetection::SingleMatch(PythonIdiom::Flask);
    }
    PythonDetection::NoMatch
}

/// Lowercased module and symbol names from import statements.
fn collect_import_names(tree: &Tree, content: &str) -> Vec<String> {
    let mut names = Vec::new();
    collect_from_node(tree.root_node(), content, &mut names);
    names
}

fn collect_from_node(node: Node, content: &str, names: &mut Vec<String>) {
    match node.kind() {
        "import_statement" | "import_from_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "dotted_name" | "identifier" | "relative_import" => {
                        if let Ok(text) = child.utf8_text(content.as_bytes()) {
                            names.push(text.to_lowercase());
                        }
                    }
                    "aliased_import" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            if let Ok(text) = name.utf8_text(content.as_bytes()) {
                                names.push(text.to_lowercase());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_from_node(child, content, names);
            }
        }
    }
}

/// Content sniff for files with nonstandard extensions.
pub fn looks_like_express(content: &str) -> bool {
    content.contains("express") && content.contains(".get(")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::PythonRouteExtractor;

    fn detect(source: &str) -> PythonDetection {
        let tree = PythonRouteExtractor::parse(source).unwrap();
        detect_python_idiom(&tree, source)
    }

    #[test]
    fn extension_routing_is_deterministic() {
        assert_eq!(grammar_family(Some("js")), GrammarFamily::JavaScript);
        assert_eq!(grammar_family(Some("ts")), GrammarFamily::JavaScript);
        assert_eq!(grammar_family(Some("py")), GrammarFamily::Python);
        assert_eq!(grammar_family(Some("go")), GrammarFamily::Go);
        assert_eq!(grammar_family(Some("rb")), GrammarFamily::Other);
        assert_eq!(grammar_family(None), GrammarFamily::Other);
    }

    #[test]
    fn fastapi_import_wins_detection() {
        assert_eq!(
            detect("from fastapi import FastAPI\napp = FastAPI()\n"),
            PythonDetection::SingleMatch(PythonIdiom::FastApi)
        );
    }

    #[test]
    fn flask_marker_detected_from_constructor_alone() {
        assert_eq!(
            detect("app = Flask(__name__)\n"),
            PythonDetection::SingleMatch(PythonIdiom::Flask)
        );
    }

    #[test]
    fn fastapi_takes_precedence_when_both_appear() {
        assert_eq!(
            detect("import fastapi\nimport flask\n"),
            PythonDetection::SingleMatch(PythonIdiom::FastApi)
        );
    }

    #[test]
    fn plain_python_has_no_match() {
        assert_eq!(detect("import os\nx = 1\n"), PythonDetection::NoMatch);
    }

    #[test]
    fn express_sniff_requires_both_markers() {
        assert!(looks_like_express("const express = require('express'); app.get('/x', h);"));
        assert!(!looks_like_express("app.get('/x', h);"));
    }
}
