//! Tracing setup for applications embedding the editor core.
//!
//! The library itself only emits through the `tracing` macros; hosts
//! call [`init`] once (idempotent) to install a formatted subscriber
//! with `RUST_LOG`-style filtering and span traces on errors.

use std::sync::Once;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install the default subscriber: env-filtered fmt output plus an
/// [`ErrorLayer`] so failure diagnostics carry span context.
///
/// Safe to call multiple times; only the first call has any effect.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("francolino=info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(ErrorLayer::default())
            .init();
    });
}
