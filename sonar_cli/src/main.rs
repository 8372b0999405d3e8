mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr, eyre};
use sonar_core::error::SonarError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;

    let mut cfg = load_config(&cli.config)?;
    if let Commands::Run {
        interval_ms,
        report_every,
        ..
    } = &cli.cmd
    {
        if let Some(ms) = interval_ms {
            cfg.poll.interval_ms = *ms;
        }
        if let Some(n) = report_every {
            cfg.poll.report_every = *n;
        }
    }
    cfg.validate()
        .map_err(|e| SonarError::Config(e.to_string()))?;

    // dropping the guard flushes the file sink
    let _file_guard = init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run { polls, .. } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("installing Ctrl-C handler")?;
            run::run_sonar(&cfg, polls, cli.json, &shutdown)?;
        }
        Commands::SelfCheck => run::self_check(&cfg, cli.json)?,
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<sonar_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    sonar_config::load_toml(&text).map_err(|e: toml::de::Error| {
        SonarError::Config(format!("{}: {}", path.display(), e.message())).into()
    })
}

/// Console layer on stderr (pretty or JSON) plus an optional JSON file sink.
fn init_tracing(
    json: bool,
    level: &str,
    logging: &sonar_config::Logging,
) -> Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err("invalid --log-level")?;
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let mut guard = None;
    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre!("logging.file has no file name: {file}"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
                .wrap_err("invalid logging.level")?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console.with_filter(console_filter))
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre!("installing tracing subscriber: {e}"))?;
    Ok(guard)
}
