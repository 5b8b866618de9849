//! Global `tracing` subscriber setup.
//!
//! Delivery outcomes (per target and per blast) are reported through this
//! log rather than returned to the trigger, so the subscriber is installed
//! before anything else in the binary.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` wins over `level` when set. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails harmlessly if a global subscriber already exists
    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_is_idempotent() {
        init_subscriber("debug");
        init_subscriber("warn");
        tracing::info!("still logging after double init");
    }
}
