//! Logger initialization.

use std::io::Write;

use clap::ValueEnum;
use log::LevelFilter;

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single lines
    Plain,
    /// One JSON object per line
    Json,
}

/// Initializes `env_logger` with the specified level and format.
///
/// `RUST_LOG` is read first; `level` then overrides it for this crate and
/// sets the global default. Chatty transport crates are clamped further
/// (never above `level`) so a browser render does not flood the log with
/// protocol frames.
pub fn init_logger(level: LevelFilter, format: LogFormat) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("hyper", level.min(LevelFilter::Info));
    builder.filter_module("reqwest", level.min(LevelFilter::Info));
    builder.filter_module("headless_chrome", level.min(LevelFilter::Warn));
    builder.filter_module("tungstenite", level.min(LevelFilter::Warn));
    builder.filter_module("domhtml", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":\"{}\",\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    buf.timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {:<5} [{}] {}",
                    buf.timestamp_millis(),
                    record.level(),
                    record.target(),
                    record.args()
                )
            });
        }
    }

    builder.try_init()
}
