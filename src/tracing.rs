//! Tracing initialization.
//!
//! Diagnostics always go to stderr so that command output on stdout stays
//! machine-readable. `RUST_LOG` refines the default level.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing at the default level (`info`, or `debug` under test).
/// Safe to call multiple times.
pub fn init() {
    init_with_level(None);
}

/// Initialize tracing with an explicit default level. Only the first call in
/// a process has any effect.
pub fn init_with_level(level: Option<tracing::Level>) {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        let default_level = level.unwrap_or(if is_test {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        });
        let filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .compact();

        if is_test {
            // Leaked so the default stays installed for the whole test binary
            std::mem::forget(builder.with_test_writer().finish().set_default());
        } else if let Err(e) = builder.with_writer(std::io::stderr).try_init() {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}
