use serde::{Deserialize, Serialize};

/// Executor plugin configuration (`[executor]` in the TOML config).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// "text" or "jsonl"
    #[serde(default = "default_output_format")]
    pub format: String,
    #[serde(default)]
    pub ascii_only: bool,
    /// Progress bars on stderr; only honoured for text output on a TTY.
    #[serde(default = "default_true")]
    pub progress_bar: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            ascii_only: false,
            progress_bar: true,
        }
    }
}

fn default_output_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

/// Delay between attempts. How many attempts a task gets is a property of
/// the task and its role, not of this section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_retry_strategy() -> String {
    "exponential-backoff".to_string()
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}
