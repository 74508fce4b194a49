use archproof_core::{normalize, Route};

/// What a tracked assumption blames when the model is unsatisfiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssumptionKind {
    MissingAuth,
    MissingRoute,
}

/// Structured record attached to a tracked solver assumption at creation
/// time. Diagnostic translation is a direct lookup by tracker symbol name,
/// never string parsing of the name itself.
#[derive(Debug, Clone)]
pub struct AssumptionTag {
    pub kind: AssumptionKind,
    pub service: String,
    pub route_name: String,
}

impl AssumptionTag {
    pub fn message(&self) -> String {
        match self.kind {
            AssumptionKind::MissingAuth => format!(
                "Policy Violation: Authentication is required for route '{}' but is not implemented in its middleware.",
                self.route_name
            ),
            AssumptionKind::MissingRoute => format!(
                "Policy Violation: The route '{}', which requires authentication, is not implemented.",
                self.route_name
            ),
        }
    }
}

/// Exact method plus normalized-path match against the implementation.
pub fn find_implementation_route<'a>(
    routes: &[&'a Route],
    method: &str,
    path: &str,
) -> Option<&'a Route> {
    let wanted = normalize::normalize_route_path(path);
    routes
        .iter()
        .copied()
        .find(|r| r.method == method && normalize::normalize_route_path(&r.path) == wanted)
}
