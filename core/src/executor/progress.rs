use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Visual progress for a run: one overall bar plus a spinner for the task in
/// flight. Drawn on stderr; a disabled monitor is a no-op.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    current: Option<(String, ProgressBar)>,
    enabled: bool,
    ascii: bool,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, enabled: bool, ascii: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                current: None,
                enabled: false,
                ascii,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        let chars = if ascii { "#>-" } else { "█▓▒░  " };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks {msg}")
        {
            overall.set_style(style.progress_chars(chars));
        }
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            current: None,
            enabled: true,
            ascii,
        }
    }

    /// Shows a spinner for `task_id`, replacing any previous one.
    pub fn start_task(&mut self, task_id: &str, role: &str, attempt: u32) {
        if !self.enabled {
            return;
        }
        let label = if attempt == 0 {
            format!("{task_id} ({role})")
        } else {
            format!("{task_id} ({role}) retry {attempt}")
        };

        if let Some((id, bar)) = &self.current {
            if id == task_id {
                bar.set_message(label);
                return;
            }
        }
        self.clear_current();

        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            let style = if self.ascii {
                style.tick_strings(&["-", "\\", "|", "/", "+"])
            } else {
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            };
            bar.set_style(style);
        }
        bar.set_message(label);
        bar.enable_steady_tick(Duration::from_millis(100));
        self.current = Some((task_id.to_string(), bar));
    }

    pub fn complete_task(&mut self, task_id: &str, success: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }
        if let Some((id, bar)) = self.current.take() {
            if id == task_id {
                let icon = self.icon(success);
                bar.finish_with_message(format!("{icon} {task_id} ({duration_ms}ms)"));
            } else {
                bar.finish_and_clear();
            }
        }
        self.overall.inc(1);
    }

    pub fn skip_task(&mut self, task_id: &str) {
        if !self.enabled {
            return;
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.finish_with_message(format!("- {task_id} (skipped)"));
        self.overall.inc(1);
    }

    pub fn set_message(&self, msg: &str) {
        if self.enabled {
            self.overall.set_message(msg.to_string());
        }
    }

    pub fn finish(&mut self, success: bool) {
        if !self.enabled {
            return;
        }
        self.clear_current();
        let msg = if success {
            format!("{} All tasks completed", self.icon(true))
        } else {
            format!("{} Execution failed", self.icon(false))
        };
        self.overall.finish_with_message(msg);
    }

    fn icon(&self, success: bool) -> &'static str {
        match (self.ascii, success) {
            (true, true) => "[ok]",
            (true, false) => "[x]",
            (false, true) => "✅",
            (false, false) => "❌",
        }
    }

    fn clear_current(&mut self) {
        if let Some((_, bar)) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        self.clear_current();
    }
}
