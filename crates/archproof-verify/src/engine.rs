// ABOUTME: The verification pipeline: cycle gate, symbolic model build,
// ABOUTME: Z3 decision, unsat-core translation and report assembly.
use archproof_core::{Route, RouteDocument, SpecDocument, VerificationResult};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};
use z3::ast::Bool;
use z3::{Config, Context, SatResult, Solver};

use crate::analyzers;
use crate::constraints::{find_implementation_route, AssumptionKind, AssumptionTag};
use crate::graph::{format_cycle, DependencyGraph};

/// Deadline for one decision-procedure call. Expiry is reported as a
/// distinct inconclusive outcome, never a hang.
pub const SOLVER_TIMEOUT_MS: u64 = 10_000;

const CORE_UNAVAILABLE: &str =
    "Could not determine the unsatisfiable core. The constraints may have a fundamental conflict.";
const INCONCLUSIVE: &str =
    "Verification inconclusive: the solver exceeded its deadline before reaching a verdict.";

enum SolveOutcome {
    Satisfiable(BTreeMap<String, bool>),
    Unsatisfiable(Vec<String>),
    Inconclusive,
}

/// Verify an implementation route model against the declared specification.
///
/// Heuristic analyzers run on every path; the solver is only consulted when
/// the synchronous-communication graph is acyclic.
pub fn verify(spec: &SpecDocument, implementation: &RouteDocument) -> VerificationResult {
    let routes: Vec<&Route> = implementation.all_routes().collect();
    let edges = spec.communication_edges();
    let sync_graph = DependencyGraph::from_sync_edges(&edges);

    let mut warnings = analyzers::security_warnings(&routes);
    warnings.extend(analyzers::performance_warnings(spec, &sync_graph));
    let suggestions = analyzers::consistency_suggestions(spec, &routes);

    let cycles = sync_graph.find_cycles();
    if !cycles.is_empty() {
        warn!(
            "{} circular dependency group(s) detected; solver skipped",
            cycles.len()
        );
        return VerificationResult {
            is_satisfiable: false,
            errors: cycles.iter().map(|c| format_cycle(c)).collect(),
            warnings,
            suggestions,
            model: None,
        };
    }

    match solve(spec, &routes) {
        SolveOutcome::Satisfiable(model) => {
            info!("Model satisfiable: implementation conforms to the declared policies");
            VerificationResult {
                is_satisfiable: true,
                errors: Vec::new(),
                warnings,
                suggestions,
                model: Some(model),
            }
        }
        SolveOutcome::Unsatisfiable(errors) => VerificationResult {
            is_satisfiable: false,
            errors,
            warnings,
            suggestions,
            model: None,
        },
        SolveOutcome::Inconclusive => VerificationResult {
            is_satisfiable: false,
            errors: vec![INCONCLUSIVE.to_string()],
            warnings,
            suggestions,
            model: None,
        },
    }
}

/// Load both documents and verify. A missing or malformed document aborts
/// the run with a single explanatory error and no heuristic output.
pub fn verify_files(spec_path: &Path, routes_path: &Path) -> VerificationResult {
    let spec = match SpecDocument::load(spec_path) {
        Ok(spec) => spec,
        Err(e) => {
            return VerificationResult::unsatisfiable(vec![format!(
                "Failed to load input files: {}",
                e
            )])
        }
    };
    let implementation = match RouteDocument::load(routes_path) {
        Ok(implementation) => implementation,
        Err(e) => {
            return VerificationResult::unsatisfiable(vec![format!(
                "Failed to load input files: {}",
                e
            )])
        }
    };
    verify(&spec, &implementation)
}

/// Build the symbolic model and decide it. The Z3 context is owned by this
/// call and discarded with it; nothing is reused across runs.
fn solve(spec: &SpecDocument, routes: &[&Route]) -> SolveOutcome {
    let mut config = Config::new();
    config.set_timeout_msec(SOLVER_TIMEOUT_MS);
    let ctx = Context::new(&config);
    let solver = Solver::new(&ctx);

    // One boolean term per declared service and per (service, route) pair.
    let mut terms: Vec<(String, Bool)> = Vec::new();
    for (service_name, service) in &spec.services {
        let name = format!("service_{}", service_name);
        terms.push((name.clone(), Bool::new_const(&ctx, name.as_str())));
        for route_name in service.routes.keys() {
            let name = format!("{}_{}", service_name, route_name);
            terms.push((name.clone(), Bool::new_const(&ctx, name.as_str())));
        }
    }

    // Policy requirements become named assumptions so the unsat core can
    // blame exactly the requirement that failed.
    let mut tags: HashMap<String, AssumptionTag> = HashMap::new();
    for route_name in &spec.policies.auth_required {
        let Some((service_name, spec_route)) = spec.find_route(route_name) else {
            debug!("authRequired policy names unknown spec route '{}'", route_name);
            continue;
        };

        let kind = match find_implementation_route(routes, &spec_route.method, &spec_route.path) {
            Some(implemented) => {
                if analyzers::has_auth_middleware(implemented) {
                    continue;
                }
                AssumptionKind::MissingAuth
            }
            None => AssumptionKind::MissingRoute,
        };

        let tracker_name = format!("assumption_{}", tags.len());
        let tracker = Bool::new_const(&ctx, tracker_name.as_str());
        solver.assert_and_track(&Bool::from_bool(&ctx, false), &tracker);
        tags.insert(
            tracker_name,
            AssumptionTag {
                kind,
                service: service_name.to_string(),
                route_name: route_name.clone(),
            },
        );
    }

    match solver.check() {
        SatResult::Sat => {
            let assignment = match solver.get_model() {
                Some(model) => terms
                    .iter()
                    .map(|(name, term)| {
                        let value = model
                            .eval(term, true)
                            .and_then(|b| b.as_bool())
                            .unwrap_or(false);
                        (name.clone(), value)
                    })
                    .collect(),
                None => BTreeMap::new(),
            };
            SolveOutcome::Satisfiable(assignment)
        }
        SatResult::Unsat => {
            let core = solver.get_unsat_core();
            if core.is_empty() {
                return SolveOutcome::Unsatisfiable(vec![CORE_UNAVAILABLE.to_string()]);
            }
            let errors = core
                .iter()
                .map(|tracker| {
                    let name = tracker.to_string();
                    match tags.get(&name) {
                        Some(tag) => tag.message(),
                        None => format!("Unsatisfiable Constraint: {}", name),
                    }
                })
                .collect();
            SolveOutcome::Unsatisfiable(errors)
        }
        SatResult::Unknown => SolveOutcome::Inconclusive,
    }
}
