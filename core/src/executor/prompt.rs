use std::borrow::Cow;
use std::fmt::Write as _;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::role::Role;
use crate::task::TaskSpec;

use super::types::{Parameters, ResolvedInput};

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_\-]*)\}").unwrap();
}

/// Replaces `{name}` with the matching parameter or resolved input. Unknown
/// placeholders are left untouched.
pub fn interpolate<'t>(
    template: &'t str,
    params: &Parameters,
    inputs: &[ResolvedInput],
) -> Cow<'t, str> {
    PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        if let Some(value) = params.get(name) {
            return value.clone();
        }
        match inputs.iter().find(|i| i.name == name) {
            Some(input) => value_text(&input.value),
            None => caps[0].to_string(),
        }
    })
}

/// Composes the full prompt handed to a runner for one task.
pub fn render_prompt(
    role: &Role,
    spec: &TaskSpec,
    params: &Parameters,
    inputs: &[ResolvedInput],
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "You are {}.", role.title);
    if !role.goal.is_empty() {
        let _ = writeln!(out, "Goal: {}", interpolate(role.goal.trim(), params, inputs));
    }
    if !role.backstory.is_empty() {
        let _ = writeln!(out, "{}", interpolate(role.backstory.trim(), params, inputs));
    }

    let _ = writeln!(out, "\n## Task\n{}", interpolate(spec.description.trim(), params, inputs));

    if !spec.expected_output.is_empty() {
        let _ = writeln!(
            out,
            "\n## Expected output\n{}",
            interpolate(spec.expected_output.trim(), params, inputs)
        );
    }
    if spec.structured_output {
        out.push_str("\nRespond with a single JSON object");
        if !spec.expected_fields.is_empty() {
            let _ = write!(out, " with the keys: {}", spec.expected_fields.join(", "));
        }
        out.push_str(".\n");
    }

    if !inputs.is_empty() {
        out.push_str("\n## Context\n");
        for input in inputs {
            let _ = writeln!(out, "### {}\n{}\n", input.name, value_text(&input.value));
        }
    }

    out
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::InputSource;
    use serde_json::json;

    fn params() -> Parameters {
        Parameters::from([
            ("customer_request".to_string(), "A recipe site".to_string()),
            ("current_year".to_string(), "2026".to_string()),
        ])
    }

    #[test]
    fn interpolates_known_placeholders_only() {
        let inputs = vec![ResolvedInput {
            name: "ui_framework".into(),
            value: json!("gradio"),
        }];
        let text = interpolate(
            "Build {customer_request} with {ui_framework} in {current_year}; keep {unknown}.",
            &params(),
            &inputs,
        );
        assert_eq!(
            text,
            "Build A recipe site with gradio in 2026; keep {unknown}."
        );
    }

    #[test]
    fn prompt_lists_context_in_input_order() {
        let mut role = Role::new("tester");
        role.title = "QA Engineer".into();
        let spec = TaskSpec::new("testing_task", "tester")
            .structured()
            .with_expected_fields(["passed", "issues"])
            .with_description("Test the site for {customer_request}.")
            .input("launch_cmd", InputSource::parse("python app.py"));
        let inputs = vec![
            ResolvedInput {
                name: "launch_cmd".into(),
                value: json!("python app.py"),
            },
            ResolvedInput {
                name: "features".into(),
                value: json!(["search"]),
            },
        ];

        let prompt = render_prompt(&role, &spec, &params(), &inputs);
        assert!(prompt.starts_with("You are QA Engineer."));
        assert!(prompt.contains("Test the site for A recipe site."));
        assert!(prompt.contains("with the keys: passed, issues"));
        let launch = prompt.find("### launch_cmd").unwrap();
        let features = prompt.find("### features").unwrap();
        assert!(launch < features);
    }
}
