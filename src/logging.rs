use std::path::Path;

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "session-maker.log";

/// Sends `tracing` output to `<log_dir>/session-maker.log` so it never mixes
/// with the interactive prompts. Filtered by `RUST_LOG`, `info` by default.
///
/// The returned guard flushes the writer on drop and must outlive the run.
pub fn init(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(anyhow::Error::msg)?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::EnvFilter;

    #[test]
    fn filter_directives_parse() {
        for directive in ["info", "debug", "session_maker=trace,warn"] {
            assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
        }
    }
}
