//! Unified test logging initialization
//!
//! Shared by this crate's tests and by downstream integration tests that use
//! the ODM module.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Initialize structured logging for tests.
///
/// Idempotent and race-safe. The level is taken from, in order:
///
/// 1. `TEST_LOG` environment variable (preferred)
/// 2. `RUST_LOG` environment variable (fallback)
/// 3. `"warn"` (default, quiet)
///
/// Set `TEST_LOG_FORMAT=json` to emit JSON lines instead of the compact format.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let json = std::env::var("TEST_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

        let builder = fmt()
            .with_env_filter(filter)
            .with_test_writer() // Critical for cargo/nextest capture
            .without_time(); // Stable output

        if json {
            builder.json().try_init().ok();
        } else {
            builder.try_init().ok(); // Never panic if something else already initialized
        }
    });
}
