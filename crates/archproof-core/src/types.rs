use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Web-framework idiom a route was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    #[serde(rename = "Express.js")]
    Express,
    #[serde(rename = "FastAPI")]
    FastApi,
    Flask,
    Go,
    Mixed,
    Unknown,
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Framework::Express => "Express.js",
            Framework::FastApi => "FastAPI",
            Framework::Flask => "Flask",
            Framework::Go => "Go",
            Framework::Mixed => "Mixed",
            Framework::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "express" | "express.js" => Ok(Framework::Express),
            "fastapi" => Ok(Framework::FastApi),
            "flask" => Ok(Framework::Flask),
            "go" => Ok(Framework::Go),
            "mixed" => Ok(Framework::Mixed),
            _ => Ok(Framework::Unknown),
        }
    }
}

impl Framework {
    fn unknown() -> Self {
        Framework::Unknown
    }
}

/// A single HTTP route served by implementation code.
///
/// Identity for deduplication is `(method, path, handler)`, case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub handler: String,
    #[serde(default = "Framework::unknown")]
    pub framework: Framework,
}

impl Route {
    /// Dedup key per the route identity contract.
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.method, &self.path, &self.handler)
    }

    /// True when the path carries a parameter token in either the
    /// colon (`/users/:id`) or brace (`/users/{id}`) notation.
    pub fn has_path_parameter(&self) -> bool {
        self.path.contains(':') || self.path.contains('{')
    }
}

/// One scanned source file's worth of routes plus per-service metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub port: Option<u16>,
    pub file_path: String,
    pub framework: Framework,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub total_services: usize,
    pub total_routes: usize,
}

/// Implementation route document: the normalized output of extraction and
/// the read-only implementation input of verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteDocument {
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
    #[serde(default)]
    pub metadata: ScanMetadata,
}

impl RouteDocument {
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::ArchProofError::InputLoad(format!("{}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| crate::ArchProofError::InputLoad(format!("{}: {}", path.display(), e)))
    }

    /// Flat view over every service's routes, service order preserved.
    pub fn all_routes(&self) -> impl Iterator<Item = &Route> {
        self.services.values().flat_map(|s| s.routes.iter())
    }

    pub fn recompute_metadata(&mut self) {
        self.metadata = ScanMetadata {
            total_services: self.services.len(),
            total_routes: self.services.values().map(|s| s.routes.len()).sum(),
        };
    }
}

/// Terminal output of a verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_satisfiable: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<BTreeMap<String, bool>>,
}

impl VerificationResult {
    pub fn unsatisfiable(errors: Vec<String>) -> Self {
        Self {
            is_satisfiable: false,
            errors,
            warnings: Vec::new(),
            suggestions: Vec::new(),
            model: None,
        }
    }

    /// True when nothing at all was flagged, on any channel.
    pub fn is_clean(&self) -> bool {
        self.is_satisfiable
            && self.errors.is_empty()
            && self.warnings.is_empty()
            && self.suggestions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_labels_round_trip_serde() {
        let json = serde_json::to_string(&Framework::Express).unwrap();
        assert_eq!(json, "\"Express.js\"");
        let back: Framework = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Framework::Express);
    }

    #[test]
    fn route_parameter_detection_covers_both_notations() {
        let mut route = Route {
            name: "get_users_id".into(),
            method: "GET".into(),
            path: "/users/:id".into(),
            middleware: vec![],
            handler: "getUser".into(),
            framework: Framework::Express,
        };
        assert!(route.has_path_parameter());
        route.path = "/users/{id}".into();
        assert!(route.has_path_parameter());
        route.path = "/users".into();
        assert!(!route.has_path_parameter());
    }

    #[test]
    fn route_document_metadata_counts_services_and_routes() {
        let mut doc = RouteDocument::default();
        doc.services.insert(
            "OrdersService".into(),
            Service {
                port: Some(3000),
                file_path: "orders.js".into(),
                framework: Framework::Express,
                routes: vec![Route {
                    name: "post_orders".into(),
                    method: "POST".into(),
                    path: "/orders".into(),
                    middleware: vec!["authenticate".into()],
                    handler: "createOrder".into(),
                    framework: Framework::Express,
                }],
            },
        );
        doc.recompute_metadata();
        assert_eq!(doc.metadata.total_services, 1);
        assert_eq!(doc.metadata.total_routes, 1);
    }
}
