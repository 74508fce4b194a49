// ABOUTME: Directed graph over declared synchronous communications: cycle
// ABOUTME: detection (hard verification gate) and call-chain enumeration.
use archproof_core::{CommKind, CommunicationEdge};
use std::collections::{HashMap, HashSet};

/// Adjacency over service names, insertion-ordered for deterministic output.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    order: Vec<String>,
    adjacency: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the synchronous-communication subgraph.
    pub fn from_sync_edges(edges: &[CommunicationEdge]) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            if edge.kind == CommKind::Sync {
                graph.add_edge(&edge.source, &edge.target);
            }
        }
        graph
    }

    pub fn add_edge(&mut self, source: &str, target: &str) {
        if !self.adjacency.contains_key(source) {
            self.order.push(source.to_string());
        }
        self.adjacency
            .entry(source.to_string())
            .or_default()
            .push(target.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Directed cycles, each reported as the rotation of the DFS path
    /// starting at the repeated node (closing node not repeated).
    /// Deduplicated by unordered membership.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut path: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut cycles: Vec<Vec<String>> = Vec::new();

        for node in &self.order {
            if !visited.contains(node) {
                self.cycle_dfs(node, &mut path, &mut visited, &mut cycles);
            }
        }

        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut unique = Vec::new();
        for cycle in cycles {
            let mut key = cycle.clone();
            key.sort();
            if seen.insert(key) {
                unique.push(cycle);
            }
        }
        unique
    }

    fn cycle_dfs(
        &self,
        node: &str,
        path: &mut Vec<String>,
        visited: &mut HashSet<String>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        path.push(node.to_string());
        visited.insert(node.to_string());

        for neighbor in self.adjacency.get(node).into_iter().flatten() {
            if let Some(position) = path.iter().position(|n| n == neighbor) {
                cycles.push(path[position..].to_vec());
                continue;
            }
            if !visited.contains(neighbor) {
                self.cycle_dfs(neighbor, path, visited, cycles);
            }
        }

        path.pop();
    }

    /// Every simple path from a source node to a leaf (a node whose outgoing
    /// edges all lead back onto the current path). Paths never revisit a
    /// node, so the enumeration terminates on cyclic graphs too.
    pub fn call_chains(&self) -> Vec<Vec<String>> {
        let mut chains = Vec::new();

        for node in &self.order {
            let mut stack = vec![(node.clone(), vec![node.clone()])];
            while let Some((current, path)) = stack.pop() {
                let mut is_leaf = true;
                for neighbor in self.adjacency.get(&current).into_iter().flatten() {
                    if !path.contains(neighbor) {
                        is_leaf = false;
                        let mut extended = path.clone();
                        extended.push(neighbor.clone());
                        stack.push((neighbor.clone(), extended));
                    }
                }
                if is_leaf && path.len() > 1 {
                    chains.push(path);
                }
            }
        }

        chains
    }
}

/// Render a detected cycle with its closing node repeated.
pub fn format_cycle(cycle: &[String]) -> String {
    let mut nodes: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        nodes.push(first);
    }
    format!(
        "Architectural Error: Circular dependency detected: {}",
        nodes.join(" -> ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync(source: &str, target: &str) -> CommunicationEdge {
        CommunicationEdge {
            source: source.into(),
            target: target.into(),
            kind: CommKind::Sync,
        }
    }

    #[test]
    fn triangle_yields_exactly_one_cycle() {
        let graph =
            DependencyGraph::from_sync_edges(&[sync("A", "B"), sync("B", "C"), sync("C", "A")]);
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        let members: HashSet<&str> = cycles[0].iter().map(String::as_str).collect();
        assert_eq!(members, HashSet::from(["A", "B", "C"]));
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let graph = DependencyGraph::from_sync_edges(&[sync("A", "B"), sync("B", "C")]);
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn async_edges_are_excluded_from_the_sync_graph() {
        let edges = [
            sync("A", "B"),
            CommunicationEdge {
                source: "B".into(),
                target: "A".into(),
                kind: CommKind::Async,
            },
        ];
        let graph = DependencyGraph::from_sync_edges(&edges);
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let graph = DependencyGraph::from_sync_edges(&[sync("A", "A")]);
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["A"]);
    }

    #[test]
    fn chains_enumerate_paths_to_leaves() {
        let graph =
            DependencyGraph::from_sync_edges(&[sync("A", "B"), sync("B", "C"), sync("C", "D")]);
        let chains = graph.call_chains();
        assert!(chains.contains(&vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string()
        ]));
    }

    #[test]
    fn cycle_formatting_repeats_the_closing_node() {
        let rendered = format_cycle(&["A".to_string(), "B".to_string()]);
        assert_eq!(
            rendered,
            "Architectural Error: Circular dependency detected: A -> B -> A"
        );
    }
}
