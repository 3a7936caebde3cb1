//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Derive the default filter from the configured log level
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - Repeated initialization is a no-op (tests and embedders may race)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global fmt subscriber.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn default_directive(log_level: &str) -> String {
    format!("wsmux={log_level},tower_http={log_level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_covers_crate_and_http_layer() {
        assert_eq!(default_directive("debug"), "wsmux=debug,tower_http=debug");
        assert!(EnvFilter::try_new(default_directive("info")).is_ok());
    }
}
