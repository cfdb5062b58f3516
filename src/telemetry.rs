//! Logging setup and span constructors.

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `filter` (from the config file) is
/// used, and `info` if that does not parse either.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Span for the lifetime of one node connection.
    pub fn connection(url: &str) -> Span {
        info_span!("connection", url = %url)
    }

    /// Span for one correlated request.
    pub fn request(kind: &str, message_id: &str) -> Span {
        debug_span!("request", kind = %kind, message_id = %message_id)
    }

    /// Span for a membership refresh.
    pub fn refresh() -> Span {
        info_span!("refresh")
    }
}
