//! Logging setup for batis.
//!
//! Structured logging is controlled by environment variables.
//!
//! # Environment Variables
//!
//! - `BATIS_DEBUG=true` (or `1`, `yes`) - Enable debug logging
//! - `BATIS_LOG_LEVEL=debug|info|warn|error|trace` - Set a specific log level
//! - `BATIS_LOG_FORMAT=json|pretty|compact` - Set the output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use batis_core::logging;
//!
//! // Call once at startup
//! logging::init();
//! ```
//!
//! Inside the crates the plain tracing macros are used: `debug!` when
//! parsers and formats are registered, `warn!` for duplicate ids and action
//! mismatches, `trace!` for every prepared statement.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `BATIS_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("BATIS_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The log level from `BATIS_LOG_LEVEL`.
///
/// Defaults to "debug" if `BATIS_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("BATIS_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The log format from `BATIS_LOG_FORMAT`. Defaults to "json".
pub fn get_log_format() -> &'static str {
    env::var("BATIS_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize logging.
///
/// Does nothing unless `BATIS_DEBUG` or `BATIS_LOG_LEVEL` is set, or when
/// the `tracing-subscriber` feature is off. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("BATIS_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "batis={},batis_core={},batis_template={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let result = match get_log_format() {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if result.is_ok() {
                tracing::info!(level, format = get_log_format(), "batis logging initialized");
            }
        }
    });
}

/// Initialize logging with a specific level.
///
/// # Safety
///
/// This sets `BATIS_LOG_LEVEL`, which is unsafe in multi-threaded
/// programs. Call it early, before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var("BATIS_LOG_LEVEL", level);
    }
    init();
}

/// Initialize debug logging. Equivalent to `BATIS_DEBUG=true` plus
/// [`init`], with the same caveat as [`init_with_level`].
pub fn init_debug() {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var("BATIS_DEBUG", "true");
    }
    init();
}

/// Debug logging that only fires when `BATIS_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! batis_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::__tracing::debug!($($arg)*);
        }
    };
}

/// Trace logging that only fires when `BATIS_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! batis_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::__tracing::trace!($($arg)*);
        }
    };
}
