use anyhow::Context;
use std::{path::Path, sync::OnceLock};
use tracing::Metadata;
use tracing_appender::rolling;
use tracing_subscriber::{
    filter::filter_fn, fmt::layer as fmt_layer, prelude::*, EnvFilter, Registry,
};

use crate::config::{LoggingConfig, SERVER_COMPONENT};

/// Events from the library crate or from the running binary itself.
fn is_own_event(meta: &Metadata<'_>, component: &'static str) -> bool {
    let target = meta.target();
    target.starts_with(SERVER_COMPONENT) || target.starts_with(component)
}

/// Install the global subscriber for one process. `component` is the binary's crate
/// name; it picks the log file and lets the binary's own events reach that file.
pub fn setup_tracing(config: &LoggingConfig, component: &'static str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.level.clone().unwrap_or_else(|| "info".to_string());
        EnvFilter::new(level)
    });

    let log_path = config.file_for(component);
    let file_name = log_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file path {:?}", log_path))?;
    let directory = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {:?}", directory))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(rolling::never(directory, file_name));
    static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    let stdout_own = fmt_layer()
        .with_writer(std::io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter_fn(move |meta| is_own_event(meta, component)));

    let stdout_deps = fmt_layer()
        .with_writer(std::io::stdout)
        .with_filter(filter_fn(move |meta| !is_own_event(meta, component)));

    let file_layer = fmt_layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter_fn(move |meta| is_own_event(meta, component)));

    Registry::default()
        .with(env_filter)
        .with(stdout_own)
        .with(stdout_deps)
        .with(file_layer)
        .try_init()
        .context("failed to init tracing subscriber")?;

    tracing::debug!(component, file = %log_path.display(), "logging initialised");
    Ok(())
}
