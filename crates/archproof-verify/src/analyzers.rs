// ABOUTME: Heuristic security, performance and consistency analyzers. These
// ABOUTME: always run, independent of the solver outcome and the cycle gate.
use archproof_core::{normalize, Route, SpecDocument};

use crate::graph::DependencyGraph;

pub const AUTH_KEYWORDS: &[&str] = &["auth", "authenticate", "verify", "protect", "jwt"];
pub const VALIDATION_KEYWORDS: &[&str] = &["validate", "sanitize", "check"];

const MUTATING_METHODS: &[&str] = &["POST", "PUT", "DELETE"];

fn middleware_matches(route: &Route, keywords: &[&str]) -> bool {
    route.middleware.iter().any(|mw| {
        let lowered = mw.to_lowercase();
        keywords.iter().any(|keyword| lowered.contains(keyword))
    })
}

pub fn has_auth_middleware(route: &Route) -> bool {
    middleware_matches(route, AUTH_KEYWORDS)
}

pub fn has_validation_middleware(route: &Route) -> bool {
    middleware_matches(route, VALIDATION_KEYWORDS)
}

/// Mutating routes without auth, parameterized routes without validation.
pub fn security_warnings(routes: &[&Route]) -> Vec<String> {
    let mut warnings = Vec::new();
    for route in routes {
        if MUTATING_METHODS.contains(&route.method.as_str()) && !has_auth_middleware(route) {
            warnings.push(format!(
                "Security Warning: Missing authentication on sensitive route {} {}",
                route.method, route.path
            ));
        }
        if route.has_path_parameter() && !has_validation_middleware(route) {
            warnings.push(format!(
                "Security Warning: Missing input validation on parameterized route {}",
                route.path
            ));
        }
    }
    warnings
}

/// Long synchronous call chains, plus the absence of any timeout policy.
pub fn performance_warnings(spec: &SpecDocument, sync_graph: &DependencyGraph) -> Vec<String> {
    let mut warnings = Vec::new();

    for chain in sync_graph.call_chains() {
        if chain.len() > 3 {
            warnings.push(format!(
                "Performance Warning: Long synchronous call chain detected: {}",
                chain.join(" -> ")
            ));
        }
    }

    if spec.policies.timeout.is_empty() {
        warnings.push(
            "Performance Warning: No global timeout policies defined, which could lead to hanging requests."
                .to_string(),
        );
    }

    warnings
}

/// Spec routes with no implementation counterpart, surfaced as suggestions.
pub fn consistency_suggestions(spec: &SpecDocument, routes: &[&Route]) -> Vec<String> {
    let mut suggestions = Vec::new();

    for (service_name, service) in &spec.services {
        for (route_name, spec_route) in &service.routes {
            let wanted = normalize::normalize_route_path(&spec_route.path);
            let found = routes.iter().any(|r| {
                r.method == spec_route.method && normalize::normalize_route_path(&r.path) == wanted
            });
            if !found {
                suggestions.push(format!(
                    "Missing Implementation: Route '{}' ({} {}) is defined in the spec for service '{}' but is not found in the implementation. Consider implementing it.",
                    route_name, spec_route.method, spec_route.path, service_name
                ));
            }
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use archproof_core::Framework;

    fn route(method: &str, path: &str, middleware: &[&str]) -> Route {
        Route {
            name: normalize::route_name(method, path),
            method: method.into(),
            path: path.into(),
            middleware: middleware.iter().map(|s| s.to_string()).collect(),
            handler: "handler".into(),
            framework: Framework::Express,
        }
    }

    #[test]
    fn unprotected_parameterized_delete_yields_two_warnings() {
        let r = route("DELETE", "/users/:id", &[]);
        let warnings = security_warnings(&[&r]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Missing authentication"));
        assert!(warnings[1].contains("Missing input validation"));
    }

    #[test]
    fn plain_get_route_is_clean() {
        let r = route("GET", "/users", &[]);
        assert!(security_warnings(&[&r]).is_empty());
    }

    #[test]
    fn auth_keyword_matching_is_case_insensitive_substring() {
        let r = route("POST", "/orders", &["requireJWT"]);
        assert!(has_auth_middleware(&r));
        let warnings = security_warnings(&[&r]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn validation_keyword_suppresses_parameter_warning() {
        let r = route("GET", "/users/:id", &["checkParams"]);
        assert!(security_warnings(&[&r]).is_empty());
    }

    #[test]
    fn missing_timeout_policy_warns_exactly_once() {
        let spec = SpecDocument::default();
        let graph = DependencyGraph::default();
        let warnings = performance_warnings(&spec, &graph);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No global timeout policies"));
    }

    #[test]
    fn four_node_chain_warns_exactly_once() {
        let spec: SpecDocument = serde_json::from_str(
            r#"{
                "communications": [
                    {"source": "A", "target": "B", "type": "sync"},
                    {"source": "B", "target": "C", "type": "sync"},
                    {"source": "C", "target": "D", "type": "sync"}
                ],
                "policies": {"timeout": [{"default": "30s"}]}
            }"#,
        )
        .unwrap();
        let graph = DependencyGraph::from_sync_edges(&spec.communication_edges());
        let warnings = performance_warnings(&spec, &graph);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("A -> B -> C -> D"));
    }

    #[test]
    fn three_node_chain_is_tolerated() {
        let spec: SpecDocument = serde_json::from_str(
            r#"{
                "communications": [
                    {"source": "A", "target": "B", "type": "sync"},
                    {"source": "B", "target": "C", "type": "sync"}
                ],
                "policies": {"timeout": [{"default": "30s"}]}
            }"#,
        )
        .unwrap();
        let graph = DependencyGraph::from_sync_edges(&spec.communication_edges());
        assert!(performance_warnings(&spec, &graph).is_empty());
    }

    #[test]
    fn unimplemented_spec_route_becomes_a_suggestion() {
        let spec: SpecDocument = serde_json::from_str(
            r#"{
                "services": {
                    "orders": {"routes": {"create_order": {"method": "POST", "path": "/orders"}}}
                }
            }"#,
        )
        .unwrap();
        let suggestions = consistency_suggestions(&spec, &[]);
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].contains("create_order"));
        assert!(suggestions[0].contains("orders"));
    }

    #[test]
    fn normalized_paths_match_across_notations() {
        let spec: SpecDocument = serde_json::from_str(
            r#"{
                "services": {
                    "users": {"routes": {"get_user": {"method": "GET", "path": "/users/{id}"}}}
                }
            }"#,
        )
        .unwrap();
        let r = route("GET", "/users/:id", &[]);
        assert!(consistency_suggestions(&spec, &[&r]).is_empty());
    }
}
