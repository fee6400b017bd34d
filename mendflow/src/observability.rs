//! Tracing setup helpers.

use tracing_subscriber::EnvFilter;

/// Initializes a global tracing subscriber.
///
/// `filter` overrides the `RUST_LOG` environment variable when provided.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(filter: Option<&str>) {
    let env_filter = filter.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        EnvFilter::new,
    );

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing(Some("debug"));
        init_tracing(None);
    }
}
