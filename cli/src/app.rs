//! CLI wiring: resolve input, build the coordinator, run, report.
use std::sync::Arc;

use serde_json::json;
use sitecrew_core::api::{
    cancel_pair, AppConfig, AppContext, ArtifactStore, CliError, Crew, Parameters, RunCoordinator,
    RunInput, RunSummary,
};
use sitecrew_plugins::services::PluginServicesFactory;

use crate::commands::cli::Args;
use crate::input::{self, Console, NO_INPUT_MESSAGE};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_NO_INPUT: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 130;

pub async fn run_app(args: Args, cfg: AppConfig) -> Result<i32, CliError> {
    run_app_with_console(args, cfg, &mut input::TerminalConsole).await
}

#[tracing::instrument(name = "cli.run_app", skip_all)]
pub async fn run_app_with_console(
    args: Args,
    cfg: AppConfig,
    console: &mut dyn Console,
) -> Result<i32, CliError> {
    if args.plan {
        return print_plan(&cfg, args.json);
    }

    let Some(request) =
        input::resolve_request(args.customer_request.as_deref(), args.no_prompt, &mut *console)?
    else {
        eprintln!("{NO_INPUT_MESSAGE}");
        return Ok(EXIT_NO_INPUT);
    };

    let interactive = console.stderr_is_terminal();
    let ascii = cfg.executor.output.ascii_only;
    let factory = PluginServicesFactory::default().with_text_events(!interactive);
    let ctx = AppContext::new(cfg, Some(Arc::new(factory)));
    let (cancel, signal) = cancel_pair();
    let coordinator = RunCoordinator::new(ctx)
        .with_cancel_signal(signal)
        .with_progress_bar(interactive);

    let run_input = RunInput {
        request,
        name: args.website_name.clone(),
        overrides: args.params.iter().cloned().collect::<Parameters>(),
    };

    let run = coordinator.run(&run_input);
    tokio::pin!(run);
    let summary = tokio::select! {
        res = &mut run => res?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted by user.");
            cancel.cancel();
            // The coordinator stops at the next await point and still writes
            // a partial summary.
            if let Err(e) = run.await {
                tracing::warn!(error = %e, "Partial summary not written");
            }
            return Ok(EXIT_INTERRUPTED);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string(&summary).map_err(anyhow::Error::from)?);
    } else {
        print_human(&summary, ascii);
    }

    Ok(exit_code_for_summary(&summary))
}

pub fn exit_code_for_summary(summary: &RunSummary) -> i32 {
    if summary.cancelled {
        EXIT_INTERRUPTED
    } else if summary.ok {
        EXIT_OK
    } else {
        EXIT_FAILED
    }
}

fn print_human(summary: &RunSummary, ascii: bool) {
    let (ok_icon, fail_icon, dir_icon) = if ascii {
        ("[ok]", "[x]", "")
    } else {
        ("✅", "❌", "🗂  ")
    };

    if summary.ok {
        println!("{ok_icon} Crew finished.");
    } else if let Some(err) = &summary.error {
        println!("{fail_icon} Crew failed: {err}");
    } else if summary.cancelled {
        println!("{fail_icon} Crew cancelled.");
    } else {
        let failed = summary.failed.as_deref().unwrap_or("unknown task");
        println!("{fail_icon} Crew failed at {failed}.");
        if !summary.pending.is_empty() {
            println!("   Not run: {}", summary.pending.join(", "));
        }
    }

    let store = ArtifactStore::new(&summary.artifacts_dir);
    println!("{dir_icon}Artifacts: {}", store.root().display());
    match store.list() {
        Ok(files) => {
            for file in files {
                println!("  - {}", file.display());
            }
        }
        Err(e) => tracing::warn!(error = %e, "Cannot list artifacts"),
    }
}

fn print_plan(cfg: &AppConfig, as_json: bool) -> Result<i32, CliError> {
    let crew = Crew::load(&cfg.crew).map_err(|e| CliError::Config(e.to_string()))?;
    let order: Vec<&str> = crew.graph.topological_order().collect();

    if as_json {
        let plan = json!({
            "name": crew.definition.name,
            "process": crew.definition.process,
            "manager": crew.definition.manager,
            "order": order,
        });
        println!("{plan}");
        return Ok(EXIT_OK);
    }

    println!(
        "Crew '{}' ({} tasks):",
        crew.definition.name,
        crew.graph.len()
    );
    for (idx, id) in order.iter().enumerate() {
        let role = crew.graph.get(id).map(|t| t.role.as_str()).unwrap_or("?");
        let deps = crew.graph.dependencies(id);
        if deps.is_empty() {
            println!("  {}. {} [{}]", idx + 1, id, role);
        } else {
            println!("  {}. {} [{}] after {}", idx + 1, id, role, deps.join(", "));
        }
    }
    Ok(EXIT_OK)
}
