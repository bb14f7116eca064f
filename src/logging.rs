//! Tracing setup shared by the server and the CLI

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// `RUST_LOG` wins over the configured level
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},tower_http=debug",
            env!("CARGO_CRATE_NAME"),
            level
        ))
    })
}

/// Install the global subscriber.
///
/// Console output is pretty or JSON depending on `logging.format`. When
/// `logging.directory` is set, JSON lines are also written to a daily
/// rolling `campushive.log`; keep the returned guard alive so buffered
/// lines get flushed on exit.
pub fn init_tracing(config: &LoggingConfig) -> std::io::Result<Option<WorkerGuard>> {
    let console: BoxedLayer = if config.format.eq_ignore_ascii_case("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_filter(filter(&config.level))
            .boxed()
    } else {
        fmt::layer().with_filter(filter(&config.level)).boxed()
    };

    let mut layers = vec![console];
    let mut guard = None;

    if let Some(dir) = &config.directory {
        std::fs::create_dir_all(dir)?;
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "campushive.log");
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);

        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter(&config.level))
                .boxed(),
        );
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry().with(layers).init();
    Ok(guard)
}
