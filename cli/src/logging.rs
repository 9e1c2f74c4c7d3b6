//! Logging initialization: logs go to a file or nowhere, never to the console.
//!
//! Reads `RUST_LOG` (filter) and `LOG_FILE` (path) from env (e.g. via .env or the XDG
//! `[env]` table). stdout carries only the generated text.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::log_format::TextWithSpanIds;

/// Installs the global subscriber.
///
/// - **RUST_LOG**: e.g. `info`, `quickread=debug`. Default: `info` with HTTP internals off.
/// - **LOG_FILE**: when set, plain-text lines are appended there through a background
///   writer; keep the returned guard alive until exit so buffered lines are flushed.
pub fn init() -> std::io::Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,hyper_util=off,reqwest=warn")
    });

    let Ok(path) = std::env::var("LOG_FILE") else {
        let sink_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(sink_layer).init();
        return Ok(None);
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(&path))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(TextWithSpanIds::new())
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);
    tracing_subscriber::registry().with(file_layer).init();
    tracing::info!(path = %path, "quickread logging to file");
    Ok(Some(guard))
}
