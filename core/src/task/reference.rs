use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref PARAM_RE: Regex = Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_\-]*)\}$").unwrap();
    static ref OUTPUT_RE: Regex =
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_\-]*)\.output((?:\.[A-Za-z0-9_\-]+)*)$").unwrap();
}

/// Reference to a prior task's output, optionally narrowed to a nested field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRef {
    pub task_id: String,
    pub field_path: Vec<String>,
}

impl OutputRef {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            field_path: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.field_path.push(name.into());
        self
    }

    /// Walks `field_path` through `value`. Objects are indexed by key, arrays by
    /// position. On failure returns the dotted path that could not be found.
    pub fn lookup<'v>(&self, value: &'v Value) -> Result<&'v Value, String> {
        let mut current = value;
        for (depth, segment) in self.field_path.iter().enumerate() {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| self.field_path[..=depth].join("."))?;
        }
        Ok(current)
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.output", self.task_id)?;
        for segment in &self.field_path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Where a task input gets its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// External run parameter, written `{name}` in configuration.
    Param(String),
    /// Output of an earlier task, written `<task-id>.output[.<field>...]`.
    TaskOutput(OutputRef),
    /// Fixed value carried verbatim.
    Literal(Value),
}

impl InputSource {
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn output(task_id: impl Into<String>) -> Self {
        Self::TaskOutput(OutputRef::new(task_id))
    }

    pub fn output_field(task_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::TaskOutput(OutputRef::new(task_id).field(field))
    }

    /// Parses the configuration shorthand. Anything that is neither `{param}` nor
    /// `<task>.output...` is a literal string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(caps) = PARAM_RE.captures(trimmed) {
            return Self::Param(caps[1].to_string());
        }
        if let Some(caps) = OUTPUT_RE.captures(trimmed) {
            let field_path = caps
                .get(2)
                .map(|m| {
                    m.as_str()
                        .split('.')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            return Self::TaskOutput(OutputRef {
                task_id: caps[1].to_string(),
                field_path,
            });
        }
        Self::Literal(Value::String(raw.to_string()))
    }

    pub fn upstream(&self) -> Option<&str> {
        match self {
            Self::TaskOutput(r) => Some(r.task_id.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(name) => write!(f, "{{{name}}}"),
            Self::TaskOutput(r) => r.fmt(f),
            Self::Literal(v) => write!(f, "{v}"),
        }
    }
}
