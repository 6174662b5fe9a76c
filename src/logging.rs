use crate::config::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// Stdout always gets a layer; a rolling file layer is added when `dir` is set.
/// The returned guard must live as long as the process or buffered file
/// lines are lost.
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    let Some(dir) = config.dir.as_deref() else {
        if config.use_json {
            registry
                .with(fmt::layer().json().with_target(true).with_ansi(false))
                .init();
        } else {
            registry
                .with(fmt::layer().with_target(false).with_ansi(true))
                .init();
        }
        return None;
    };

    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(dir, &config.file),
        "daily" => tracing_appender::rolling::daily(dir, &config.file),
        _ => tracing_appender::rolling::never(dir, &config.file),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true) // Keep target in JSON for structured queries
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    Some(guard)
}
