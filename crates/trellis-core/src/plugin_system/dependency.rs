use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::Plugin;

/// A `before` hint that was dropped because honouring it would close a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionWarning {
    pub plugin: String,
    pub target: String,
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "plugin \"{}\" has an unsatisfiable \"before\" constraint on \"{}\"",
            self.plugin, self.target
        )
    }
}

/// Outcome of a successful resolution
#[derive(Clone)]
pub struct Resolution {
    /// Plugins in install order
    pub order: Vec<Arc<dyn Plugin>>,
    /// Non-fatal problems found while building the graph
    pub warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    /// Plugin names in install order
    pub fn names(&self) -> Vec<String> {
        self.order.iter().map(|p| p.name().to_string()).collect()
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("order", &self.names())
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Directed "installs before" graph over plugin indices.
///
/// An edge `a -> b` means `a` must be installed before `b`. Node indices are
/// positions in the input slice and double as the tie-break priority.
#[derive(Debug, Default)]
struct DependencyGraph {
    names: Vec<String>,
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    fn new(names: Vec<String>) -> Self {
        let edges = vec![Vec::new(); names.len()];
        Self { names, edges }
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if !self.edges[from].contains(&to) {
            self.edges[from].push(to);
        }
    }

    /// Whether `to` is reachable from `from` (a node always reaches itself)
    fn reaches(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.names.len()];
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if visited[node] {
                continue;
            }
            visited[node] = true;
            stack.extend(self.edges[node].iter().copied().filter(|n| !visited[*n]));
        }
        false
    }

    /// Find one cycle, returned as a closed path of node indices
    fn find_cycle(&self) -> Option<Vec<usize>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        fn visit(
            graph: &DependencyGraph,
            node: usize,
            marks: &mut [Mark],
            path: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            marks[node] = Mark::OnStack;
            path.push(node);
            for &next in &graph.edges[node] {
                match marks[next] {
                    Mark::OnStack => {
                        let start = path.iter().position(|n| *n == next).unwrap_or(0);
                        let mut cycle = path[start..].to_vec();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    Mark::Unvisited => {
                        if let Some(cycle) = visit(graph, next, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }
            path.pop();
            marks[node] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::Unvisited; self.names.len()];
        let mut path = Vec::new();
        for node in 0..self.names.len() {
            if marks[node] == Mark::Unvisited {
                if let Some(cycle) = visit(self, node, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Kahn's algorithm with the frontier ordered by input index, so that
    /// unconstrained plugins keep the order they were supplied in.
    /// Must only be called on an acyclic graph.
    fn topological_sort(&self) -> Vec<usize> {
        let mut in_degree = vec![0usize; self.names.len()];
        for targets in &self.edges {
            for &to in targets {
                in_degree[to] += 1;
            }
        }

        let mut frontier: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();

        let mut sorted = Vec::with_capacity(self.names.len());
        while let Some(Reverse(node)) = frontier.pop() {
            sorted.push(node);
            for &next in &self.edges[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    frontier.push(Reverse(next));
                }
            }
        }
        sorted
    }
}

/// Resolve the install order for `plugins`.
///
/// `dependencies` and `after` become hard edges (a missing dependency is an
/// error, a missing `after` target is ignored). A `before` edge is only added
/// if it does not close a cycle with the edges collected so far; otherwise it
/// is dropped and reported in [`Resolution::warnings`]. Any cycle left after
/// that is fatal.
pub fn resolve(plugins: &[Arc<dyn Plugin>]) -> Result<Resolution, PluginSystemError> {
    let names: Vec<String> = plugins.iter().map(|p| p.name().to_string()).collect();
    let index: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut graph = DependencyGraph::new(names.clone());
    let mut warnings = Vec::new();

    for (idx, plugin) in plugins.iter().enumerate() {
        for dependency in plugin.dependencies() {
            let Some(&dep_idx) = index.get(dependency.as_str()) else {
                return Err(PluginSystemError::MissingDependency {
                    plugin_id: names[idx].clone(),
                    dependency,
                });
            };
            graph.add_edge(dep_idx, idx);
        }

        for target in plugin.after() {
            match index.get(target.as_str()) {
                Some(&after_idx) => graph.add_edge(after_idx, idx),
                None => log::debug!(
                    "plugin \"{}\" wants to run after \"{}\", which is not registered; ignoring",
                    names[idx],
                    target
                ),
            }
        }

        for target in plugin.before() {
            let Some(&before_idx) = index.get(target.as_str()) else {
                continue;
            };
            if graph.reaches(before_idx, idx) {
                let warning = ResolutionWarning {
                    plugin: names[idx].clone(),
                    target,
                };
                log::warn!("{}", warning);
                warnings.push(warning);
            } else {
                graph.add_edge(idx, before_idx);
            }
        }
    }

    if let Some(cycle) = graph.find_cycle() {
        return Err(PluginSystemError::CircularDependency {
            cycle: cycle.into_iter().map(|idx| names[idx].clone()).collect(),
        });
    }

    let order = graph
        .topological_sort()
        .into_iter()
        .map(|idx| Arc::clone(&plugins[idx]))
        .collect();

    Ok(Resolution { order, warnings })
}
