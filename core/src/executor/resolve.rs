use serde_json::Value;

use crate::error::{ExecutorError, TaskError};
use crate::task::{InputSource, TaskSpec};

use super::state::ExecutionState;
use super::types::{Parameters, ResolvedInput, TaskStatus};

/// Why inputs could not be resolved.
#[derive(Debug)]
pub(crate) enum ResolveError {
    /// Scheduler invariant broken; aborts the run.
    Fatal(ExecutorError),
    /// Upstream output lacks a referenced field; fails only this task.
    Task(TaskError),
}

/// Resolves every input binding of `spec`, in declaration order.
///
/// Parameters resolve to JSON strings, literals verbatim, and task outputs to
/// the upstream's parsed value narrowed by the field path.
pub(crate) fn resolve_inputs(
    spec: &TaskSpec,
    params: &Parameters,
    state: &ExecutionState,
) -> Result<Vec<ResolvedInput>, ResolveError> {
    let mut resolved = Vec::with_capacity(spec.inputs.len());

    for binding in &spec.inputs {
        let value = match &binding.source {
            InputSource::Param(name) => params
                .get(name)
                .map(|v| Value::String(v.clone()))
                .ok_or_else(|| ResolveError::Fatal(ExecutorError::MissingParameter(name.clone())))?,
            InputSource::Literal(value) => value.clone(),
            InputSource::TaskOutput(reference) => {
                let output = match (state.status(&reference.task_id), state.output(&reference.task_id)) {
                    (Some(TaskStatus::Succeeded), Some(output)) => output,
                    _ => {
                        return Err(ResolveError::Fatal(ExecutorError::UnresolvedInput {
                            task_id: spec.id.clone(),
                            input: binding.name.clone(),
                            upstream: reference.task_id.clone(),
                        }))
                    }
                };
                reference
                    .lookup(&output.value)
                    .map_err(|field| {
                        ResolveError::Task(TaskError::MissingField {
                            input: binding.name.clone(),
                            upstream: reference.task_id.clone(),
                            field,
                        })
                    })?
                    .clone()
            }
        };

        resolved.push(ResolvedInput {
            name: binding.name.clone(),
            value,
        });
    }

    Ok(resolved)
}
