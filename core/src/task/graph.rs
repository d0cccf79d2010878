use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use crate::error::GraphError;

use super::reference::InputSource;
use super::spec::TaskSpec;

/// Task dependency graph (DAG)
///
/// Tasks are kept in declaration order; `deps[i]` / `dependents[i]` hold indices
/// into `tasks`.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<TaskSpec>,

    /// task_id -> declaration index
    index: HashMap<String, usize>,

    /// Dependency edges: index -> upstream indices
    deps: Vec<Vec<usize>>,

    /// Reverse edges: index -> downstream indices
    dependents: Vec<Vec<usize>>,

    /// Parameters a run is expected to supply
    expected_params: BTreeSet<String>,
}

impl TaskGraph {
    pub fn new<I, S>(expected_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected_params: expected_params.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Adds a task. Every `<task>.output` reference must name a task that is
    /// already in the graph, so the graph stays acyclic by construction.
    pub fn add_task(&mut self, spec: TaskSpec) -> Result<(), GraphError> {
        if self.index.contains_key(&spec.id) {
            return Err(GraphError::DuplicateTask(spec.id));
        }

        for binding in &spec.inputs {
            let dangling = match &binding.source {
                InputSource::Param(name) => !self.expected_params.contains(name),
                InputSource::TaskOutput(r) => !self.index.contains_key(&r.task_id),
                InputSource::Literal(_) => false,
            };
            if dangling {
                return Err(GraphError::DanglingReference {
                    task_id: spec.id.clone(),
                    input: binding.name.clone(),
                    reference: binding.source.to_string(),
                });
            }
        }

        self.push(spec);
        Ok(())
    }

    fn push(&mut self, spec: TaskSpec) {
        let idx = self.tasks.len();
        self.index.insert(spec.id.clone(), idx);
        self.tasks.push(spec);
        self.deps.push(Vec::new());
        self.dependents.push(Vec::new());
        self.link(idx);
    }

    fn link(&mut self, idx: usize) {
        let upstream: Vec<usize> = self.tasks[idx]
            .dependencies()
            .into_iter()
            .filter_map(|id| self.index.get(id).copied())
            .collect();
        for &up in &upstream {
            if !self.dependents[up].contains(&idx) {
                self.dependents[up].push(idx);
            }
        }
        self.deps[idx] = upstream;
    }

    /// Inserts without reference checks, then re-links every task. Lets tests
    /// build graphs that `add_task` would never produce.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, spec: TaskSpec) {
        self.push(spec);
        for dependents in &mut self.dependents {
            dependents.clear();
        }
        for idx in 0..self.tasks.len() {
            self.link(idx);
        }
    }

    /// Validate the graph before execution
    pub fn validate(&self) -> Result<(), GraphError> {
        if let Some(cycle) = self.detect_cycle() {
            return Err(GraphError::CycleDetected(cycle));
        }
        Ok(())
    }

    /// Lazy topological order using Kahn's algorithm
    ///
    /// Among tasks with no remaining unresolved dependency the earliest declared
    /// goes first, so repeated calls yield the same sequence. Each call returns a
    /// fresh iterator.
    ///
    /// # Time Complexity
    ///
    /// O((V + E) log V) where V = number of tasks, E = number of dependencies
    pub fn topological_order(&self) -> TopologicalOrder<'_> {
        let in_degree: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let ready = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        TopologicalOrder {
            graph: self,
            in_degree,
            ready,
        }
    }

    pub fn get(&self, id: &str) -> Option<&TaskSpec> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, &self.deps)
    }

    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, &self.dependents)
    }

    fn neighbours(&self, id: &str, edges: &[Vec<usize>]) -> Vec<&str> {
        self.index
            .get(id)
            .map(|&i| {
                edges[i]
                    .iter()
                    .map(|&j| self.tasks[j].id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn expected_params(&self) -> &BTreeSet<String> {
        &self.expected_params
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Detect circular dependencies using DFS
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = vec![false; self.tasks.len()];
        let mut stack = Vec::new();

        for idx in 0..self.tasks.len() {
            if !visited[idx] && self.dfs_cycle(idx, &mut visited, &mut stack) {
                return Some(self.format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(&self, node: usize, visited: &mut [bool], stack: &mut Vec<usize>) -> bool {
        visited[node] = true;
        stack.push(node);

        for &dep in &self.deps[node] {
            // Dependency already on the current path: cycle
            if let Some(pos) = stack.iter().position(|&x| x == dep) {
                stack.push(dep);
                stack.drain(..pos);
                return true;
            }

            if !visited[dep] && self.dfs_cycle(dep, visited, stack) {
                return true;
            }
        }

        stack.pop();
        false
    }

    fn format_cycle_path(&self, stack: &[usize]) -> String {
        stack
            .iter()
            .map(|&i| self.tasks[i].id.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Iterator returned by [`TaskGraph::topological_order`].
///
/// Stops early if the graph contains a cycle; call [`TaskGraph::validate`] first.
pub struct TopologicalOrder<'g> {
    graph: &'g TaskGraph,
    in_degree: Vec<usize>,
    ready: BinaryHeap<Reverse<usize>>,
}

impl<'g> Iterator for TopologicalOrder<'g> {
    type Item = &'g str;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse(idx) = self.ready.pop()?;
        for &dependent in &self.graph.dependents[idx] {
            let degree = &mut self.in_degree[dependent];
            *degree -= 1;
            if *degree == 0 {
                self.ready.push(Reverse(dependent));
            }
        }
        Some(self.graph.tasks[idx].id.as_str())
    }
}
