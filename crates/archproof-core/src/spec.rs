// ABOUTME: Serde shapes for the declarative architecture specification document.
// ABOUTME: Accepts both structured and legacy string communication entries.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{ArchProofError, Result};

/// A route as the specification declares it, keyed by route name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRoute {
    pub method: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecService {
    #[serde(default)]
    pub routes: BTreeMap<String, SpecRoute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommKind {
    Sync,
    Async,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Declared inter-service communication with a resolved kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunicationEdge {
    pub source: String,
    pub target: String,
    pub kind: CommKind,
}

/// Wire form of a communication entry.
///
/// The structured object is the primary contract; the legacy
/// `"A -> B: METHOD /path"` string form is still accepted and parsed into
/// the same edge shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommunicationEntry {
    Structured {
        source: String,
        target: String,
        #[serde(rename = "type", default)]
        kind: CommKind,
    },
    Legacy(String),
}

impl CommunicationEntry {
    /// Resolve the wire form into an edge; malformed legacy strings yield None.
    pub fn resolve(&self) -> Option<CommunicationEdge> {
        match self {
            CommunicationEntry::Structured {
                source,
                target,
                kind,
            } => Some(CommunicationEdge {
                source: source.clone(),
                target: target.clone(),
                kind: *kind,
            }),
            CommunicationEntry::Legacy(text) => {
                let (lhs, rhs) = text.split_once("->")?;
                let source = lhs.split_whitespace().next()?.to_string();
                let target = rhs.trim().split(':').next()?.trim().to_string();
                if source.is_empty() || target.is_empty() {
                    return None;
                }
                let lowered = text.to_lowercase();
                let kind = if lowered.contains("async") {
                    CommKind::Async
                } else if lowered.contains("sync") {
                    CommKind::Sync
                } else {
                    CommKind::Unknown
                };
                Some(CommunicationEdge {
                    source,
                    target,
                    kind,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policies {
    #[serde(default, rename = "authRequired")]
    pub auth_required: Vec<String>,
    #[serde(default)]
    pub timeout: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The declarative specification document: intended services, routes,
/// communications and policies. Read-only input to verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecDocument {
    #[serde(default)]
    pub services: BTreeMap<String, SpecService>,
    #[serde(default)]
    pub communications: Vec<CommunicationEntry>,
    #[serde(default)]
    pub policies: Policies,
    #[serde(default)]
    pub properties: Vec<String>,
}

impl SpecDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ArchProofError::SpecLoad(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ArchProofError::SpecLoad(format!("{}: {}", path.display(), e)))
    }

    /// All resolvable communication edges, wire order preserved.
    pub fn communication_edges(&self) -> Vec<CommunicationEdge> {
        self.communications
            .iter()
            .filter_map(CommunicationEntry::resolve)
            .collect()
    }

    /// Find a spec route and its owning service by policy join key.
    pub fn find_route(&self, route_name: &str) -> Option<(&str, &SpecRoute)> {
        for (service_name, service) in &self.services {
            if let Some(route) = service.routes.get(route_name) {
                return Some((service_name.as_str(), route));
            }
        }
        None
    }
}
