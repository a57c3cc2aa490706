//! Tracing bootstrap for binaries embedding the graph.
//!
//! Only available with the `logging` feature. The library itself just
//! emits `tracing` events; embedders that already carry a subscriber
//! should keep it and never call into this module.

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INSTALL: Once = Once::new();

/// Install a compact stderr subscriber for traversal diagnostics.
///
/// The filter comes from `SKEIN_LOG`, then `RUST_LOG`, then the given
/// default directive (e.g. `"info"` or `"skein_graph=debug"`). Only the
/// first call per process takes effect.
pub fn init_tracing(default_directive: &str) {
    let fallback = default_directive.to_string();
    INSTALL.call_once(move || {
        let filter = std::env::var("SKEIN_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(fallback));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(true))
            .init();
    });
}
