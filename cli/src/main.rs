use std::path::PathBuf;

use clap::Parser;
use sitecrew_cli::app;
use sitecrew_cli::commands::cli;
use sitecrew_core::api as core_api;
use sitecrew_core::api::CliError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[sitecrew] Error: {e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let mut cfg = core_api::load(args.config.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;
    if let Some(dir) = &args.artifacts_dir {
        cfg.artifacts.directory = dir.clone();
    }
    init_tracing(&cfg.logging).map_err(CliError::Command)?;
    tracing::debug!(runner = ?cfg.runner, artifacts = %cfg.artifacts.directory, "config loaded");

    app::run_app(args, cfg).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 1: pipeline or config failure
    // 2: no input (returned as a normal exit code, not as an error)
    // 130: interrupted (likewise)
    match e {
        CliError::Config(_) => app::EXIT_FAILED,
        CliError::Run(_) => app::EXIT_FAILED,
        CliError::Io(_) => app::EXIT_FAILED,
        CliError::Command(_) => app::EXIT_FAILED,
        CliError::Anyhow(_) => app::EXIT_FAILED,
    }
}

/// Log directory: configured, else a per-user temp directory.
fn log_dir(logging: &core_api::LoggingConfig) -> PathBuf {
    logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("sitecrew"))
}

fn file_writer(
    logging: &core_api::LoggingConfig,
) -> Result<tracing_appender::non_blocking::NonBlocking, String> {
    let dir = log_dir(logging);
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("cannot create log directory {}: {e}", dir.display()))?;
    let appender =
        tracing_appender::rolling::never(&dir, format!("sitecrew.{}.log", std::process::id()));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // Dropping the guard would stop the background writer.
    let _ = LOG_GUARD.set(guard);
    Ok(writer)
}

fn init_tracing(logging: &core_api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        return Err("logging enabled but both console and file outputs are off".to_string());
    }

    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| EnvFilter::try_new(&logging.level), EnvFilter::try_new)
        .map_err(|e| format!("invalid log filter: {e}"))?;

    let file_layer = if logging.file {
        let writer = file_writer(logging)?;
        Some(fmt::layer().with_writer(writer).with_ansi(false))
    } else {
        None
    };
    let console_layer = logging.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
