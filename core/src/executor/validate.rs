use serde_json::Value;

use crate::error::TaskError;
use crate::task::TaskSpec;

use super::types::TaskOutput;

/// Turns raw runner text into a [`TaskOutput`], enforcing the structured
/// output contract when the task asks for one.
pub(crate) fn to_output(spec: &TaskSpec, raw: String) -> Result<TaskOutput, TaskError> {
    if !spec.structured_output {
        return Ok(TaskOutput::text(raw));
    }
    let value = parse_structured(&raw, &spec.expected_fields)?;
    Ok(TaskOutput::structured(raw, value))
}

/// Parses a JSON object out of `raw` and checks that every expected top-level
/// key is present. A Markdown code fence is tolerated anywhere in the text,
/// as is prose around it.
pub fn parse_structured(raw: &str, expected_fields: &[String]) -> Result<Value, TaskError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskError::Validation("empty output".to_string()));
    }

    let value = parse_first(&candidates(trimmed))?;

    let Some(object) = value.as_object() else {
        return Err(TaskError::Validation(format!(
            "expected a JSON object, got {}",
            kind_of(&value)
        )));
    };

    let missing: Vec<&str> = expected_fields
        .iter()
        .filter(|f| !object.contains_key(f.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(TaskError::Validation(format!(
            "missing fields: {}",
            missing.join(", ")
        )));
    }

    Ok(value)
}

/// Spans of `text` that may hold the answer, most specific first: the body of
/// the first code fence, the whole text, then the outermost `{...}`.
fn candidates(text: &str) -> Vec<&str> {
    let mut spans = Vec::with_capacity(3);
    if let Some(body) = fenced_body(text) {
        spans.push(body);
    }
    spans.push(text);
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            spans.push(&text[start..=end]);
        }
    }
    spans
}

/// The first parse that succeeds; otherwise the error of the first span.
fn parse_first(spans: &[&str]) -> Result<Value, TaskError> {
    let mut first_err = None;
    for span in spans.iter().filter(|s| !s.is_empty()) {
        match serde_json::from_str::<Value>(span) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    Err(TaskError::Validation(match first_err {
        Some(e) => format!("not valid JSON: {e}"),
        None => "empty output".to_string(),
    }))
}

fn fenced_body(text: &str) -> Option<&str> {
    const FENCE: &str = "```";
    let open = text.find(FENCE)?;
    let mut body = &text[open + FENCE.len()..];
    // The info string (`json`, `JSON`, ...) only counts as one when a newline ends it.
    if let Some((info, rest)) = body.split_once('\n') {
        if !info.trim().contains(char::is_whitespace) && !info.contains('{') {
            body = rest;
        }
    }
    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    Some(body.trim())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_fenced_object() {
        let raw = "```json\n{\"website_folder\": \"website\", \"files\": []}\n```\n";
        let value = parse_structured(raw, &fields(&["website_folder", "files"])).unwrap();
        assert_eq!(value["website_folder"], json!("website"));
    }

    #[test]
    fn accepts_single_line_fence() {
        let raw = "```json {\"features\": [], \"pages\": [\"home\"]}```";
        let value = parse_structured(raw, &fields(&["features", "pages"])).unwrap();
        assert_eq!(value["pages"], json!(["home"]));
    }

    #[test]
    fn accepts_fence_followed_by_prose() {
        let raw = "```json\n{\"passed\": true, \"issues\": []}\n```\nLet me know if you need changes.";
        let value = parse_structured(raw, &fields(&["passed", "issues"])).unwrap();
        assert_eq!(value["passed"], json!(true));
    }

    #[test]
    fn accepts_prose_before_fence() {
        let raw = "Here is the plan:\n```json\n{\"features\": [\"login\"]}\n```";
        let value = parse_structured(raw, &fields(&["features"])).unwrap();
        assert_eq!(value["features"], json!(["login"]));
    }

    #[test]
    fn falls_back_to_outer_braces() {
        let raw = "The report: {\"score\": 8, \"notes\": {\"ui\": \"clean\"}} Thanks!";
        let value = parse_structured(raw, &fields(&["score"])).unwrap();
        assert_eq!(value["notes"]["ui"], json!("clean"));
    }

    #[test]
    fn empty_output_is_rejected() {
        assert_eq!(
            parse_structured("  \n ", &[]).unwrap_err(),
            TaskError::Validation("empty output".into())
        );
    }

    #[test]
    fn rejects_non_object() {
        let err = parse_structured("[1, 2]", &[]).unwrap_err();
        assert_eq!(
            err,
            TaskError::Validation("expected a JSON object, got an array".into())
        );
        assert!(matches!(
            parse_structured("Sure! Here you go.", &[]),
            Err(TaskError::Validation(_))
        ));
    }

    #[test]
    fn reports_missing_fields() {
        let err = parse_structured(r#"{"passed": true}"#, &fields(&["passed", "issues", "log"]))
            .unwrap_err();
        assert_eq!(
            err,
            TaskError::Validation("missing fields: issues, log".into())
        );
    }

    #[test]
    fn narrative_tasks_keep_raw_text() {
        let spec = TaskSpec::new("team_leader_task", "team_leader");
        let output = to_output(&spec, "# Blueprint".to_string()).unwrap();
        assert_eq!(output.value, json!("# Blueprint"));
        assert!(!output.is_structured());
    }
}
