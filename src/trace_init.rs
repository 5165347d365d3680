//! JSON trace output for the `trace` feature.
//!
//! Library code only emits `tracing` events; a host process (the command
//! line tool, an embedding application) decides where they go by calling
//! [`init_tracing`] once at startup.

use std::io;
use std::path::Path;

/// File created inside the trace directory.
pub const TRACE_FILE: &str = "phrasa-trace.jsonl";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "phrasa_engine=debug,phrasa_core=debug";

/// Starts writing JSON trace lines to `log_dir/phrasa-trace.jsonl`, creating
/// the directory if needed.
///
/// Returns `Ok(true)` if this call installed the subscriber, `Ok(false)` if
/// one was already installed by an earlier call or the crate was built
/// without the `trace` feature.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> io::Result<bool> {
    use std::sync::Mutex;

    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    static INSTALLED: Mutex<bool> = Mutex::new(false);

    let mut installed = INSTALLED
        .lock()
        .map_err(|e| io::Error::other(e.to_string()))?;
    if *installed {
        return Ok(false);
    }

    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, TRACE_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .try_init()
        .map_err(io::Error::other)?;

    // The worker flushes until process exit.
    std::mem::forget(guard);
    *installed = true;
    Ok(true)
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) -> io::Result<bool> {
    Ok(false)
}
