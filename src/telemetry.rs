//! Tracing subscriber setup for the binary.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` when set, otherwise debug output for this crate.
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // axum logs rejections from built-in extractors with the `axum::rejection`
        // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
        format!(
            "{}=debug,tower_http=debug,axum::rejection=trace",
            env!("CARGO_CRATE_NAME")
        )
        .into()
    })
}

/// Installs the global subscriber. Call once.
pub fn init_tracing(json: bool) {
    let registry = tracing_subscriber::registry().with(default_filter());

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Runs `f` with a plain-text subscriber writing to `make_writer`.
///
/// Startup work that runs before [`init_tracing`] (loading the config that
/// decides the log format) still gets its events recorded.
pub fn with_bootstrap_logging<W, T>(make_writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(make_writer)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}
