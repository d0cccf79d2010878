use tracing::warn;

use super::state::ExecutionState;
use super::traits::{NextStep, SchedulingStrategy};
use super::types::TaskStatus;

/// Picks the next step, or `None` once nothing is Ready.
///
/// Without a strategy, the earliest declared Ready task runs. A strategy may
/// reorder or skip, but only among Ready tasks.
pub(crate) fn select_next(
    state: &ExecutionState,
    strategy: Option<&dyn SchedulingStrategy>,
) -> Option<NextStep> {
    let fallback = state.ready().first().map(|id| NextStep::Run(id.to_string()))?;

    let Some(strategy) = strategy else {
        return Some(fallback);
    };

    match strategy.decide_next(state) {
        Some(step) if state.status(step.task_id()) == Some(TaskStatus::Ready) => Some(step),
        Some(step) => {
            warn!(
                strategy = strategy.name(),
                decision = ?step,
                "Ignoring coordinator decision for a task that is not ready"
            );
            Some(fallback)
        }
        None => Some(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::TaskOutput;
    use crate::task::{InputSource, TaskGraph, TaskSpec};

    struct Fixed(Option<NextStep>);

    impl SchedulingStrategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn decide_next(&self, _state: &ExecutionState) -> Option<NextStep> {
            self.0.clone()
        }
    }

    fn state() -> ExecutionState {
        let mut graph = TaskGraph::new(["req"]);
        for id in ["frontend", "backend"] {
            graph
                .add_task(TaskSpec::new(id, "dev").input("q", InputSource::param("req")))
                .unwrap();
        }
        graph
            .add_task(TaskSpec::new("integration", "int").input("f", InputSource::output("frontend")))
            .unwrap();
        ExecutionState::new(&graph)
    }

    #[test]
    fn default_is_declaration_order() {
        assert_eq!(
            select_next(&state(), None),
            Some(NextStep::Run("frontend".into()))
        );
    }

    #[test]
    fn strategy_can_reorder_and_skip_ready_tasks() {
        let state = state();
        let reorder = Fixed(Some(NextStep::Run("backend".into())));
        assert_eq!(
            select_next(&state, Some(&reorder)),
            Some(NextStep::Run("backend".into()))
        );
        let skip = Fixed(Some(NextStep::Skip("frontend".into())));
        assert_eq!(
            select_next(&state, Some(&skip)),
            Some(NextStep::Skip("frontend".into()))
        );
    }

    #[test]
    fn invalid_decisions_fall_back() {
        let state = state();
        let premature = Fixed(Some(NextStep::Run("integration".into())));
        assert_eq!(
            select_next(&state, Some(&premature)),
            Some(NextStep::Run("frontend".into()))
        );
        let unknown = Fixed(Some(NextStep::Skip("deploy".into())));
        assert_eq!(
            select_next(&state, Some(&unknown)),
            Some(NextStep::Run("frontend".into()))
        );
    }

    #[test]
    fn nothing_ready_means_done() {
        let mut graph = TaskGraph::new(Vec::<String>::new());
        graph.add_task(TaskSpec::new("only", "r")).unwrap();
        let mut state = ExecutionState::new(&graph);
        state.mark_succeeded(&graph, "only", TaskOutput::text("done"));
        assert_eq!(select_next(&state, None), None);
    }
}
