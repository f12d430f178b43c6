//! Logging initialization.
//!
//! Thin wrapper over the observability crate. Every VaultPass process writes
//! structured JSONL to `~/.vaultpass/logs/vaultpass.jsonl`; stdout is never
//! used because the native-messaging host owns it.

use crate::Paths;

/// Initialize logging for the CLI.
///
/// ```ignore
/// init_logging("info", &paths, false);
/// tracing::info!("ready");
/// ```
pub fn init_logging(level: &str, paths: &Paths, also_stderr: bool) {
    init_logging_for_service("vaultpass", level, paths, also_stderr);
}

/// Initialize logging with a custom service name.
///
/// The native-messaging host uses `vaultpass-host` so that its lines can be
/// told apart from CLI invocations in the shared log file.
pub fn init_logging_for_service(service_name: &str, level: &str, paths: &Paths, also_stderr: bool) {
    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
