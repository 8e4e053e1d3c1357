//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Startup banner and shutdown message
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::LogLevel;

use crate::config::Config;
use std::io;
use std::path::Path;

/// Farewell printed once the listener has stopped
pub const FAREWELL: &str = "Server stopped";

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> io::Result<()> {
    let level = config
        .logging
        .level
        .parse()
        .map_err(|e: String| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(true, |w| w.enabled(level))
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// The four startup lines, in order
pub fn banner_lines(port: u16, root: &Path, landing_page: &str) -> [String; 4] {
    [
        format!("Server running at http://localhost:{port}/"),
        format!("Serving directory: {}", root.display()),
        format!("Open http://localhost:{port}{landing_page}"),
        "Press Ctrl+C to stop".to_string(),
    ]
}

/// Startup banner. Always printed to the console, whatever the log targets.
pub fn log_server_start(port: u16, root: &Path, landing_page: &str) {
    for line in banner_lines(port, root, landing_page) {
        println!("{line}");
    }
}

pub fn log_config(config: &Config) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_info(&format!(
        "[CONFIG] Listening on {}:{}",
        config.server.host, config.server.port
    ));
    match config.server.workers {
        Some(workers) => write_info(&format!("[CONFIG] Worker threads: {workers}")),
        None => write_info("[CONFIG] Worker threads: CPU cores"),
    }
    write_info(&format!(
        "[CONFIG] Log level: {}, access log: {} ({})",
        config.logging.level, config.logging.access_log, config.logging.access_log_format
    ));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("[CONFIG] Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("[CONFIG] Error log: {path}"));
    }
}

/// Blank line, then the farewell
pub fn log_shutdown() {
    println!("\n{FAREWELL}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
