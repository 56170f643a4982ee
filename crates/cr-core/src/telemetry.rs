//! Tracing bootstrap.
//!
//! Library crates only emit `tracing` events; the embedding binary (or a test
//! harness) decides where they go by calling [`init_tracing`] once.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a global subscriber with an env filter and a formatting layer.
///
/// `RUST_LOG` takes precedence over `default_directive` (for example
/// `"cr_auth=debug,info"`). Returns `false` if a global subscriber was
/// already installed, which makes repeated calls from tests harmless.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init_tracing("info");
        assert!(!init_tracing("debug"));
    }
}
