#![deny(missing_docs)]
//! Shared logging utilities for the page loader workspace.
//!
//! Provides the `loader_*` macros used by the engine and the app. Every line
//! is stamped with the session's virtual clock so that timer-driven sequences
//! (fade-out, fetch, fade-in, widget reinit) read in the order they fired.

use std::sync::atomic::{AtomicU64, Ordering};

/// Virtual clock of the running page session, in milliseconds.
static CLOCK_MS: AtomicU64 = AtomicU64::new(0);

/// Sets the virtual clock reported in log lines.
/// The session driver calls this whenever it advances its timer queue.
pub fn set_clock_ms(ms: u64) {
    CLOCK_MS.store(ms, Ordering::Relaxed);
}

/// Returns the virtual clock reported in log lines (0 before any session ran).
pub fn clock_ms() -> u64 {
    CLOCK_MS.load(Ordering::Relaxed)
}

/// Logs a trace-level message stamped with the virtual clock.
#[macro_export]
macro_rules! loader_trace {
    ($($arg:tt)*) => {{
        log::trace!("[t+{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message stamped with the virtual clock.
#[macro_export]
macro_rules! loader_debug {
    ($($arg:tt)*) => {{
        log::debug!("[t+{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message stamped with the virtual clock.
#[macro_export]
macro_rules! loader_info {
    ($($arg:tt)*) => {{
        log::info!("[t+{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message stamped with the virtual clock.
#[macro_export]
macro_rules! loader_warn {
    ($($arg:tt)*) => {{
        log::warn!("[t+{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message stamped with the virtual clock.
#[macro_export]
macro_rules! loader_error {
    ($($arg:tt)*) => {{
        log::error!("[t+{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
