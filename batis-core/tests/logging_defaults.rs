//! Logging defaults with no `BATIS_*` variables set.
//!
//! Lives in its own test binary because it clears process environment
//! variables that the runtime reads while logging.

use batis_core::logging::{get_log_format, get_log_level, is_debug_enabled};
use pretty_assertions::assert_eq;

#[test]
fn test_log_defaults() {
    // SAFETY: the only test in this binary, so no other thread reads them
    unsafe {
        std::env::remove_var("BATIS_DEBUG");
        std::env::remove_var("BATIS_LOG_LEVEL");
        std::env::remove_var("BATIS_LOG_FORMAT");
    }
    assert!(!is_debug_enabled());
    assert_eq!(get_log_level(), "warn");
    assert_eq!(get_log_format(), "json");
}
