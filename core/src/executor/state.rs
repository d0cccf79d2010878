use std::collections::HashMap;

use crate::task::TaskGraph;

use super::types::{TaskOutput, TaskStatus};

/// Mutable per-run view of the graph: task statuses plus the outputs of
/// succeeded tasks. Owned by the scheduler; strategies only get `&self`.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    /// Declaration order.
    order: Vec<String>,
    statuses: HashMap<String, TaskStatus>,
    outputs: HashMap<String, TaskOutput>,
}

impl ExecutionState {
    /// Root tasks start Ready, everything else Pending.
    pub fn new(graph: &TaskGraph) -> Self {
        let order: Vec<String> = graph.tasks().iter().map(|t| t.id.clone()).collect();
        let statuses = graph
            .tasks()
            .iter()
            .map(|t| {
                let status = if graph.dependencies(&t.id).is_empty() {
                    TaskStatus::Ready
                } else {
                    TaskStatus::Pending
                };
                (t.id.clone(), status)
            })
            .collect();
        Self {
            order,
            statuses,
            outputs: HashMap::new(),
        }
    }

    pub fn status(&self, id: &str) -> Option<TaskStatus> {
        self.statuses.get(id).copied()
    }

    /// Ready tasks in declaration order.
    pub fn ready(&self) -> Vec<&str> {
        self.with_status(TaskStatus::Ready)
    }

    pub fn with_status(&self, status: TaskStatus) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.statuses.get(id.as_str()) == Some(&status))
            .map(String::as_str)
            .collect()
    }

    /// Tasks that never started: Pending or still Ready.
    pub fn not_started(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| {
                matches!(
                    self.statuses.get(id.as_str()),
                    Some(TaskStatus::Pending | TaskStatus::Ready)
                )
            })
            .cloned()
            .collect()
    }

    pub fn output(&self, id: &str) -> Option<&TaskOutput> {
        self.outputs.get(id)
    }

    pub(crate) fn mark_running(&mut self, id: &str) {
        self.set(id, TaskStatus::Running);
    }

    pub(crate) fn mark_failed(&mut self, id: &str) {
        self.set(id, TaskStatus::Failed);
    }

    pub(crate) fn mark_skipped(&mut self, id: &str) {
        self.set(id, TaskStatus::Skipped);
    }

    /// Records the output and promotes every dependent whose upstream tasks
    /// have all succeeded. Returns the newly Ready ids.
    pub(crate) fn mark_succeeded(
        &mut self,
        graph: &TaskGraph,
        id: &str,
        output: TaskOutput,
    ) -> Vec<String> {
        self.set(id, TaskStatus::Succeeded);
        self.outputs.insert(id.to_string(), output);

        let mut promoted = Vec::new();
        for dependent in graph.dependents(id) {
            if self.status(dependent) != Some(TaskStatus::Pending) {
                continue;
            }
            let all_done = graph
                .dependencies(dependent)
                .iter()
                .all(|dep| self.status(dep) == Some(TaskStatus::Succeeded));
            if all_done {
                self.set(dependent, TaskStatus::Ready);
                promoted.push(dependent.to_string());
            }
        }
        promoted
    }

    fn set(&mut self, id: &str, status: TaskStatus) {
        if let Some(slot) = self.statuses.get_mut(id) {
            *slot = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{InputSource, TaskSpec};
    use pretty_assertions::assert_eq;

    fn diamond() -> TaskGraph {
        let mut graph = TaskGraph::new(["req"]);
        graph
            .add_task(TaskSpec::new("plan", "planner").input("q", InputSource::param("req")))
            .unwrap();
        graph
            .add_task(TaskSpec::new("front", "fe").input("p", InputSource::output("plan")))
            .unwrap();
        graph
            .add_task(TaskSpec::new("back", "be").input("p", InputSource::output("plan")))
            .unwrap();
        graph
            .add_task(
                TaskSpec::new("integrate", "int")
                    .input("f", InputSource::output("front"))
                    .input("b", InputSource::output("back")),
            )
            .unwrap();
        graph
    }

    #[test]
    fn only_roots_start_ready() {
        let graph = diamond();
        let state = ExecutionState::new(&graph);
        assert_eq!(state.ready(), vec!["plan"]);
        assert_eq!(state.status("integrate"), Some(TaskStatus::Pending));
    }

    #[test]
    fn success_promotes_dependents_once_all_inputs_done() {
        let graph = diamond();
        let mut state = ExecutionState::new(&graph);

        state.mark_running("plan");
        let promoted = state.mark_succeeded(&graph, "plan", TaskOutput::text("p"));
        assert_eq!(promoted, vec!["front", "back"]);
        assert_eq!(state.ready(), vec!["front", "back"]);

        assert!(state
            .mark_succeeded(&graph, "front", TaskOutput::text("f"))
            .is_empty());
        assert_eq!(
            state.mark_succeeded(&graph, "back", TaskOutput::text("b")),
            vec!["integrate"]
        );
        assert_eq!(state.output("front").unwrap().raw, "f");
    }

    #[test]
    fn failure_leaves_dependents_pending() {
        let graph = diamond();
        let mut state = ExecutionState::new(&graph);
        state.mark_succeeded(&graph, "plan", TaskOutput::text("p"));
        state.mark_failed("front");
        state.mark_succeeded(&graph, "back", TaskOutput::text("b"));

        assert_eq!(state.status("integrate"), Some(TaskStatus::Pending));
        assert_eq!(state.not_started(), vec!["integrate".to_string()]);
    }
}
