use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log to a file: the terminal belongs to the line editor.
///
/// Keep the returned guard alive for the life of the program, or buffered
/// lines are lost on exit.
pub fn init_tracing(log_file: &Path) -> Result<WorkerGuard> {
    // RUST_LOG=tether_core=trace,tether_bridge=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact()
        .try_init();

    Ok(guard)
}

pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        // A panic mid-line would otherwise leave the shell in raw mode.
        let _ = crossterm::terminal::disable_raw_mode();

        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");

        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".to_string());

        tracing::error!(%location, %payload, "panic");
        eprintln!("\r\ntether panicked at {}: {}\r", location, payload);
    }));
}
