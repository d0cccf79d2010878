use std::collections::BTreeSet;

use tracing::debug;

use sitecrew_core::api::{ExecutionState, ManagerConfig, NextStep, SchedulingStrategy};

/// Coordinator policy for crews run with a manager role.
///
/// Ready tasks listed in `skip` are dropped first; otherwise the first ready
/// task in `prefer` order runs. With nothing to say it defers to the default
/// declaration order.
pub struct ManagerStrategy {
    prefer: Vec<String>,
    skip: BTreeSet<String>,
}

impl ManagerStrategy {
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            prefer: config.prefer.clone(),
            skip: config.skip.iter().cloned().collect(),
        }
    }

    pub fn is_passive(&self) -> bool {
        self.prefer.is_empty() && self.skip.is_empty()
    }
}

impl SchedulingStrategy for ManagerStrategy {
    fn name(&self) -> &str {
        "manager"
    }

    fn decide_next(&self, state: &ExecutionState) -> Option<NextStep> {
        let ready = state.ready();
        if let Some(id) = ready.iter().find(|id| self.skip.contains(**id)) {
            debug!(task_id = %id, "Manager skips task");
            return Some(NextStep::Skip(id.to_string()));
        }
        self.prefer
            .iter()
            .find(|id| ready.contains(&id.as_str()))
            .map(|id| NextStep::Run(id.clone()))
    }
}
